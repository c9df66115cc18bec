pub mod keycloak_admin;
pub mod keycloak_oidc;

pub use keycloak_admin::*;
pub use keycloak_oidc::*;

use crate::application::ports::{config::KeycloakConfig, IdentityProvider};
use std::sync::Arc;

/// Wire both Keycloak adapters over one shared HTTP client.
pub fn keycloak_identity_provider(config: &KeycloakConfig, client: reqwest::Client) -> IdentityProvider {
    IdentityProvider::new(
        Arc::new(KeycloakAdminAdapter::new(config.clone(), client.clone())),
        Arc::new(KeycloakOidcClient::new(config, client)),
    )
}
