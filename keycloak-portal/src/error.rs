use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use keycloak_identity::{ConfigError, DomainError};
use thiserror::Error;
use tracing::error;

const ERROR_PAGE: &str = include_str!("../templates/error.html");

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Template error: {0}")]
    Template(#[from] handlebars::TemplateError),

    #[error("Render error: {0}")]
    Render(#[from] handlebars::RenderError),

    #[error("Session encoding error: {0}")]
    Session(#[from] serde_json::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Domain(DomainError::ExternalService { .. }) => StatusCode::BAD_GATEWAY,
            AppError::Domain(DomainError::NotFound { .. }) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // The detail goes to the log only
        error!("Request failed: {}", self);

        let status = self.status();
        let page = ERROR_PAGE
            .replace("{{status}}", status.as_str())
            .replace("{{reason}}", status.canonical_reason().unwrap_or("Error"));

        (status, Html(page)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
