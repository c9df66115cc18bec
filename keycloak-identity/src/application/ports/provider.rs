use super::{admin::IdentityAdminPort, oidc::OidcPort};
use std::sync::Arc;

/// Both capability groups of the identity provider, shared across requests
#[derive(Clone)]
pub struct IdentityProvider {
    admin: Arc<dyn IdentityAdminPort>,
    oidc: Arc<dyn OidcPort>,
}

impl IdentityProvider {
    pub fn new(admin: Arc<dyn IdentityAdminPort>, oidc: Arc<dyn OidcPort>) -> Self {
        Self { admin, oidc }
    }

    pub fn admin(&self) -> &Arc<dyn IdentityAdminPort> {
        &self.admin
    }

    pub fn oidc(&self) -> &Arc<dyn OidcPort> {
        &self.oidc
    }
}

impl std::fmt::Debug for IdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityProvider").finish_non_exhaustive()
    }
}
