use crate::{config::Config, error::AppError, templates::Templates};
use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use keycloak_identity::{infrastructure::adapters::keycloak_identity_provider, IdentityProvider};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub identity: IdentityProvider,
    pub templates: Arc<Templates>,
    cookie_key: Key,
}

impl AppState {
    /// Wire the Keycloak adapters over one HTTP client built from the config.
    pub fn new(config: Config) -> Result<Self, AppError> {
        let client = config.http.build_client()?;
        let identity = keycloak_identity_provider(&config.keycloak, client);
        Self::with_identity(config, identity)
    }

    pub fn with_identity(config: Config, identity: IdentityProvider) -> Result<Self, AppError> {
        let cookie_key = config.cookie_key();
        Ok(Self {
            config: Arc::new(config),
            identity,
            templates: Arc::new(Templates::new()?),
            cookie_key,
        })
    }

    pub fn secure_cookies(&self) -> bool {
        self.config.secure_cookies
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}
