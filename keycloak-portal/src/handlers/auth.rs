use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::{CookieJar, PrivateCookieJar};
use keycloak_identity::{DomainError, UserSummary};
use serde_json::json;
use tracing::info;

use super::render_page;
use crate::{
    error::AppResult,
    forms::{FormErrors, LoginForm, RegistrationForm, USERNAME_TAKEN_MESSAGE},
    session::{
        access_token_cookie, clear_access_token, push_flash, CurrentUser, SessionData, LOGIN_PATH,
    },
    state::AppState,
};

pub const REGISTERED_MESSAGE: &str = "Registration successful! You can now log in.";

fn register_page_with(
    state: &AppState,
    jar: PrivateCookieJar,
    user: Option<&UserSummary>,
    form: &RegistrationForm,
    errors: &FormErrors,
) -> AppResult<Response> {
    render_page(
        state,
        jar,
        "register",
        "Register",
        user,
        json!({ "form": form, "errors": errors.by_field() }),
    )
}

pub async fn register_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: PrivateCookieJar,
) -> AppResult<Response> {
    register_page_with(
        &state,
        jar,
        user.as_ref(),
        &RegistrationForm::default(),
        &FormErrors::default(),
    )
}

pub async fn register(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: PrivateCookieJar,
    Form(form): Form<RegistrationForm>,
) -> AppResult<Response> {
    let form = form.normalized();

    if let Err(errors) = form.validate(&state.identity).await {
        return register_page_with(&state, jar, user.as_ref(), &form, &errors);
    }

    match form.save(&state.identity).await {
        Ok(_) => {
            let jar = push_flash(jar, REGISTERED_MESSAGE, state.secure_cookies())?;
            Ok((jar, Redirect::to(LOGIN_PATH)).into_response())
        }
        // Taken between validation and creation
        Err(DomainError::AlreadyExists { .. }) => {
            let mut errors = FormErrors::default();
            errors.add("username", USERNAME_TAKEN_MESSAGE);
            register_page_with(&state, jar, user.as_ref(), &form, &errors)
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn login_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: PrivateCookieJar,
) -> AppResult<Response> {
    render_page(
        &state,
        jar,
        "login",
        "Log in",
        user.as_ref(),
        json!({ "form": LoginForm::default(), "errors": {} }),
    )
}

pub async fn login(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    jar: PrivateCookieJar,
    cookies: CookieJar,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let form = form.normalized();

    let validated = match form.validate(&state.identity).await {
        Ok(validated) => validated,
        Err(errors) => {
            return render_page(
                &state,
                jar,
                "login",
                "Log in",
                user.as_ref(),
                json!({ "form": form, "errors": errors.by_field() }),
            );
        }
    };

    let (user, token) = validated.save();
    let secure = state.secure_cookies();
    let session = SessionData::logged_in(user.as_summary()?, token.access_token.clone());

    let jar = session.store(jar, secure)?;
    let cookies = cookies.add(access_token_cookie(token.access_token, secure));

    info!("User '{}' logged in", user.username());
    Ok((jar, cookies, Redirect::to("/")).into_response())
}

pub async fn logout(jar: PrivateCookieJar, cookies: CookieJar) -> impl IntoResponse {
    (
        SessionData::clear(jar),
        clear_access_token(cookies),
        Redirect::to("/"),
    )
}
