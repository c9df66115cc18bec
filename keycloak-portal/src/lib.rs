pub mod config;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod session;
pub mod state;
pub mod templates;

pub use config::Config;
pub use error::AppError;
pub use state::AppState;

use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/profile", get(handlers::home::profile))
        .route_layer(middleware::from_fn(session::login_required));

    Router::new()
        .route("/", get(handlers::home::home))
        .route(
            "/auth/register",
            get(handlers::auth::register_page).post(handlers::auth::register),
        )
        .route(
            "/auth/login",
            get(handlers::auth::login_page).post(handlers::auth::login),
        )
        .route("/auth/logout", get(handlers::auth::logout))
        .merge(protected)
        .route("/health", get(handlers::health::health_check))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session::load_user,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
