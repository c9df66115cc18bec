use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, PrivateCookieJar, SameSite};
use keycloak_identity::UserSummary;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tracing::debug;

use crate::error::AppResult;

pub const SESSION_COOKIE: &str = "session";
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const FLASH_COOKIE: &str = "flash";

pub const LOGIN_PATH: &str = "/auth/login";

fn build_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .path("/")
        .build()
}

fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

/// Browser session, kept encrypted in the `session` cookie
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub user: Option<UserSummary>,
    pub access_token: Option<String>,
}

impl SessionData {
    pub fn logged_in(user: UserSummary, access_token: String) -> Self {
        Self {
            user: Some(user),
            access_token: Some(access_token),
        }
    }

    pub fn encode(&self) -> AppResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// `None` for anything that does not decode, including stale layouts.
    pub fn decode(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    pub fn from_jar(jar: &PrivateCookieJar) -> Option<Self> {
        jar.get(SESSION_COOKIE)
            .and_then(|cookie| Self::decode(cookie.value()))
    }

    pub fn store(&self, jar: PrivateCookieJar, secure: bool) -> AppResult<PrivateCookieJar> {
        Ok(jar.add(build_cookie(SESSION_COOKIE, self.encode()?, secure)))
    }

    /// Drop the whole session, pending flash messages included.
    pub fn clear(jar: PrivateCookieJar) -> PrivateCookieJar {
        jar.remove(removal(SESSION_COOKIE)).remove(removal(FLASH_COOKIE))
    }
}

/// Plain `access_token` cookie set next to the session on login
pub fn access_token_cookie(access_token: String, secure: bool) -> Cookie<'static> {
    build_cookie(ACCESS_TOKEN_COOKIE, access_token, secure)
}

pub fn clear_access_token(jar: CookieJar) -> CookieJar {
    jar.remove(removal(ACCESS_TOKEN_COOKIE))
}

/// Queue a one-shot message for the next rendered page.
pub fn push_flash(jar: PrivateCookieJar, message: &str, secure: bool) -> AppResult<PrivateCookieJar> {
    let mut messages = read_flashes(&jar);
    messages.push(message.to_string());
    let value = serde_json::to_string(&messages)?;
    Ok(jar.add(build_cookie(FLASH_COOKIE, value, secure)))
}

/// Consume pending messages; the returned jar no longer carries them.
pub fn take_flashes(jar: PrivateCookieJar) -> (PrivateCookieJar, Vec<String>) {
    let messages = read_flashes(&jar);
    if messages.is_empty() {
        return (jar, messages);
    }
    (jar.remove(removal(FLASH_COOKIE)), messages)
}

fn read_flashes(jar: &PrivateCookieJar) -> Vec<String> {
    jar.get(FLASH_COOKIE)
        .and_then(|cookie| serde_json::from_str(cookie.value()).ok())
        .unwrap_or_default()
}

/// Session user of the current request, set by [`load_user`]
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<UserSummary>);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .unwrap_or_default())
    }
}

/// Runs on every request: decode the session into a [`CurrentUser`].
pub async fn load_user(jar: PrivateCookieJar, mut request: Request, next: Next) -> Response {
    let user = SessionData::from_jar(&jar).and_then(|session| session.user);
    request.extensions_mut().insert(CurrentUser(user));
    next.run(request).await
}

/// Guard for views that need a logged-in user.
pub async fn login_required(CurrentUser(user): CurrentUser, request: Request, next: Next) -> Response {
    if user.is_none() {
        debug!("Anonymous request to {}, redirecting to login", request.uri().path());
        return Redirect::to(LOGIN_PATH).into_response();
    }
    next.run(request).await
}
