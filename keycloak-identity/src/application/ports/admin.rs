use crate::domain::{entities::*, errors::DomainResult};
use async_trait::async_trait;

/// Admin capability of the identity provider, scoped to the configured realm
#[async_trait]
pub trait IdentityAdminPort: Send + Sync {
    // User operations

    /// Resolve a user id by exact username; `None` when no user matches.
    async fn find_user_id(&self, username: &str) -> DomainResult<Option<String>>;

    /// Fetch a user record; `DomainError::NotFound` when the id does not resolve.
    async fn get_user(&self, user_id: &str) -> DomainResult<UserProfile>;

    /// Create a user and return the id assigned by the provider.
    async fn create_user(&self, user: &NewUser) -> DomainResult<String>;

    /// Apply a partial update; only the fields set in `update` are sent.
    async fn update_user(&self, user_id: &str, update: &UserUpdate) -> DomainResult<()>;

    async fn set_user_password(
        &self,
        user_id: &str,
        password: &str,
        temporary: bool,
    ) -> DomainResult<()>;

    async fn delete_user(&self, user_id: &str) -> DomainResult<()>;

    // Client registration operations

    /// Resolve the internal id of a client registration by its client id.
    async fn find_client(&self, client_id: &str) -> DomainResult<Option<String>>;

    async fn create_client(&self, template: &ClientTemplate) -> DomainResult<String>;
}
