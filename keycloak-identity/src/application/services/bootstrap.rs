use crate::{application::ports::IdentityAdminPort, domain::entities::ClientTemplate};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Result of the startup client registration check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapOutcome {
    AlreadyPresent,
    Created { id: String },
    Failed { reason: String },
}

/// Makes sure the OIDC client registration exists before serving requests.
///
/// Best effort: failures are logged and reported, never raised, so startup
/// carries on when the provider is unreachable.
pub struct ClientBootstrapService {
    admin: Arc<dyn IdentityAdminPort>,
    client_id: String,
    template: ClientTemplate,
}

impl ClientBootstrapService {
    pub fn new(
        admin: Arc<dyn IdentityAdminPort>,
        client_id: &str,
        client_secret: &str,
        template: ClientTemplate,
    ) -> Self {
        Self {
            admin,
            client_id: client_id.to_string(),
            template: template.with_credentials(client_id, client_secret),
        }
    }

    #[instrument(skip(self), fields(client_id = %self.client_id))]
    pub async fn ensure_client_exists(&self) -> BootstrapOutcome {
        match self.admin.find_client(&self.client_id).await {
            Ok(Some(_)) => {
                info!("OIDC client '{}' already registered", self.client_id);
                return BootstrapOutcome::AlreadyPresent;
            }
            Ok(None) => {}
            Err(e) => {
                error!("Error looking up client '{}': {}", self.client_id, e);
                return BootstrapOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        }

        match self.admin.create_client(&self.template).await {
            Ok(id) => {
                info!("Registered OIDC client '{}' ({})", self.client_id, id);
                BootstrapOutcome::Created { id }
            }
            Err(e) => {
                error!("Error creating client '{}': {}", self.client_id, e);
                BootstrapOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }
}
