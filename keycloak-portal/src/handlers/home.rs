use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{CookieJar, PrivateCookieJar};
use keycloak_identity::KeycloakUser;
use serde_json::json;
use tracing::warn;

use super::render_page;
use crate::{
    error::AppResult,
    session::{clear_access_token, CurrentUser, SessionData, LOGIN_PATH},
    state::AppState,
};

pub async fn home(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: PrivateCookieJar,
) -> AppResult<Response> {
    render_page(&state, jar, "home", "Home", user.as_ref(), json!({}))
}

/// Live view of the session user: re-read from the provider, with token status.
pub async fn profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: PrivateCookieJar,
    cookies: CookieJar,
) -> AppResult<Response> {
    let Some(summary) = user else {
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    };
    let session = SessionData::from_jar(&jar).unwrap_or_default();

    let user = match KeycloakUser::from_user_id(&state.identity, &summary.user_id).await {
        Ok(user) => user,
        Err(e) if e.is_not_found() => {
            warn!("Session user '{}' no longer exists", summary.username);
            let jar = SessionData::clear(jar);
            let cookies = clear_access_token(cookies);
            return Ok((jar, cookies, Redirect::to(LOGIN_PATH)).into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let (token_active, userinfo) = match session.access_token.as_deref() {
        Some(token) => (user.check_token(token).await?, user.get_userinfo(token).await),
        None => (false, None),
    };

    let current = user.as_summary()?;
    render_page(
        &state,
        jar,
        "profile",
        "Profile",
        Some(&current),
        json!({ "token_active": token_active, "userinfo": userinfo }),
    )
}
