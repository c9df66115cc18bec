pub mod auth;
pub mod health;
pub mod home;

use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::PrivateCookieJar;
use keycloak_identity::UserSummary;
use serde::Serialize;

use crate::{
    error::AppResult,
    session::take_flashes,
    state::AppState,
    templates::Page,
};

/// Render a page, consuming any pending flash messages.
fn render_page<T: Serialize>(
    state: &AppState,
    jar: PrivateCookieJar,
    name: &str,
    title: &str,
    current_user: Option<&UserSummary>,
    data: T,
) -> AppResult<Response> {
    let (jar, flashes) = take_flashes(jar);
    let page = Page::new(title, current_user).with_flashes(flashes);
    let html = state.templates.render(name, page, data)?;
    Ok((jar, html).into_response())
}
