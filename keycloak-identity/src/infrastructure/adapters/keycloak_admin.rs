use async_trait::async_trait;
use keycloak::types::*;
use keycloak::{KeycloakAdmin, KeycloakAdminToken, KeycloakError};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::application::ports::{admin::IdentityAdminPort, config::KeycloakConfig};
use crate::domain::{entities::*, errors::*};

/// Keycloak admin REST adapter implementing the IdentityAdminPort
///
/// The admin token is acquired lazily and re-acquired once whenever a call is
/// answered with 401, since admin tokens are short-lived.
pub struct KeycloakAdminAdapter {
    config: KeycloakConfig,
    client: reqwest::Client,
    admin: RwLock<Option<Arc<KeycloakAdmin>>>,
}

impl KeycloakAdminAdapter {
    pub fn new(config: KeycloakConfig, client: reqwest::Client) -> Self {
        Self {
            config,
            client,
            admin: RwLock::new(None),
        }
    }

    fn realm(&self) -> &str {
        &self.config.realm
    }

    async fn acquire(&self) -> Result<Arc<KeycloakAdmin>, KeycloakError> {
        let token = KeycloakAdminToken::acquire_custom_realm(
            self.config.base_url(),
            &self.config.admin_username,
            &self.config.admin_password,
            &self.config.realm,
            &self.config.admin_client_id,
            "password",
            &self.client,
        )
        .await?;

        let admin = Arc::new(KeycloakAdmin::new(
            self.config.base_url(),
            token,
            self.client.clone(),
        ));
        *self.admin.write().await = Some(admin.clone());

        Ok(admin)
    }

    async fn current_admin(&self) -> Result<Arc<KeycloakAdmin>, KeycloakError> {
        if let Some(admin) = self.admin.read().await.as_ref() {
            return Ok(admin.clone());
        }
        self.acquire().await
    }

    async fn call<T, F, Fut>(&self, operation: F) -> Result<T, KeycloakError>
    where
        F: Fn(Arc<KeycloakAdmin>) -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, KeycloakError>> + Send,
        T: Send,
    {
        let admin = self.current_admin().await?;
        match operation(admin).await {
            Err(KeycloakError::HttpFailure { status: 401, .. }) => {
                debug!("Admin token rejected, acquiring a new one");
                let admin = self.acquire().await?;
                operation(admin).await
            }
            result => result,
        }
    }

    fn user_representation(user: &NewUser) -> UserRepresentation {
        let credentials = user
            .credentials
            .iter()
            .map(|credential| CredentialRepresentation {
                type_: Some(credential.type_.clone().into()),
                value: Some(credential.value.clone().into()),
                temporary: Some(credential.temporary),
                ..Default::default()
            })
            .collect();

        UserRepresentation {
            username: Some(user.username.clone().into()),
            email: Some(user.email.clone().into()),
            first_name: Some(user.first_name.clone().into()),
            last_name: Some(user.last_name.clone().into()),
            enabled: Some(user.enabled),
            email_verified: Some(user.email_verified),
            realm_roles: Some(user.realm_roles.iter().map(|r| r.clone().into()).collect()),
            credentials: Some(credentials),
            ..Default::default()
        }
    }

    fn update_representation(update: &UserUpdate) -> UserRepresentation {
        UserRepresentation {
            email: update.email.as_ref().map(|e| e.clone().into()),
            first_name: update.first_name.as_ref().map(|f| f.clone().into()),
            last_name: update.last_name.as_ref().map(|l| l.clone().into()),
            ..Default::default()
        }
    }

    fn convert_user_from_keycloak(user_id: &str, user: UserRepresentation) -> DomainResult<UserProfile> {
        let username = user
            .username
            .ok_or_else(|| DomainError::Serialization {
                message: format!("User {user_id} has no username"),
            })?
            .to_string();

        Ok(UserProfile {
            id: user
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| user_id.to_string()),
            username,
            email: user.email.map(|e| e.to_string()),
            first_name: user.first_name.map(|f| f.to_string()),
            last_name: user.last_name.map(|l| l.to_string()),
        })
    }
}

fn status_of(err: &KeycloakError) -> Option<u16> {
    match err {
        KeycloakError::HttpFailure { status, .. } => Some(*status),
        _ => None,
    }
}

fn external(operation: &str, err: KeycloakError) -> DomainError {
    DomainError::keycloak(format!("Failed to {operation}: {err}"))
}

#[async_trait]
impl IdentityAdminPort for KeycloakAdminAdapter {
    // User operations
    async fn find_user_id(&self, username: &str) -> DomainResult<Option<String>> {
        let realm = self.realm();
        let users = self
            .call(|admin| {
                let username = username.to_string();
                async move {
                    admin
                        .realm_users_get(
                            realm,
                            Some(true), // brief_representation
                            None,       // email
                            None,       // email_verified
                            None,       // enabled
                            Some(true), // exact
                            None,       // first
                            None,       // first_name
                            None,       // idp_alias
                            None,       // idp_user_id
                            None,       // last_name
                            Some(1),    // max
                            None,       // q
                            None,       // search
                            Some(username),
                        )
                        .await
                }
            })
            .await
            .map_err(|e| external("find user by username", e))?;

        Ok(users
            .into_iter()
            .find(|user| {
                user.username
                    .as_ref()
                    .is_some_and(|name| usernames_match(&name.to_string(), username))
            })
            .and_then(|user| user.id)
            .map(|id| id.to_string()))
    }

    async fn get_user(&self, user_id: &str) -> DomainResult<UserProfile> {
        let realm = self.realm();
        let user = self
            .call(|admin| async move { admin.realm_users_with_user_id_get(realm, user_id, None).await })
            .await
            .map_err(|e| match status_of(&e) {
                Some(404) => DomainError::user_not_found(user_id),
                _ => external("find user by ID", e),
            })?;

        Self::convert_user_from_keycloak(user_id, user)
    }

    async fn create_user(&self, user: &NewUser) -> DomainResult<String> {
        let realm = self.realm();
        let representation = Self::user_representation(user);

        let response = self
            .call(|admin| {
                let representation = representation.clone();
                async move { admin.realm_users_post(realm, representation).await }
            })
            .await
            .map_err(|e| match status_of(&e) {
                Some(409) => DomainError::AlreadyExists {
                    entity: "User".to_string(),
                    identifier: user.username.clone(),
                },
                _ => external("create user", e),
            })?;

        if let Some(id) = response.to_id() {
            return Ok(id.to_string());
        }

        // No Location header: find the created user to get the ID
        self.find_user_id(&user.username)
            .await?
            .ok_or_else(|| DomainError::keycloak("User created but could not retrieve ID"))
    }

    async fn update_user(&self, user_id: &str, update: &UserUpdate) -> DomainResult<()> {
        let realm = self.realm();
        let representation = Self::update_representation(update);

        self.call(|admin| {
            let representation = representation.clone();
            async move {
                admin
                    .realm_users_with_user_id_put(realm, user_id, representation)
                    .await
            }
        })
        .await
        .map_err(|e| match status_of(&e) {
            Some(404) => DomainError::user_not_found(user_id),
            _ => external("update user", e),
        })?;

        Ok(())
    }

    async fn set_user_password(
        &self,
        user_id: &str,
        password: &str,
        temporary: bool,
    ) -> DomainResult<()> {
        let realm = self.realm();
        let credential = CredentialRepresentation {
            type_: Some("password".to_string().into()),
            value: Some(password.to_string().into()),
            temporary: Some(temporary),
            ..Default::default()
        };

        self.call(|admin| {
            let credential = credential.clone();
            async move {
                admin
                    .realm_users_with_user_id_reset_password_put(realm, user_id, credential)
                    .await
            }
        })
        .await
        .map_err(|e| match status_of(&e) {
            Some(404) => DomainError::user_not_found(user_id),
            _ => external("set user password", e),
        })?;

        Ok(())
    }

    async fn delete_user(&self, user_id: &str) -> DomainResult<()> {
        let realm = self.realm();

        self.call(|admin| async move { admin.realm_users_with_user_id_delete(realm, user_id).await })
            .await
            .map_err(|e| match status_of(&e) {
                Some(404) => DomainError::user_not_found(user_id),
                _ => external("delete user", e),
            })?;

        Ok(())
    }

    // Client registration operations
    async fn find_client(&self, client_id: &str) -> DomainResult<Option<String>> {
        let realm = self.realm();
        let clients = self
            .call(|admin| {
                let client_id = client_id.to_string();
                async move {
                    admin
                        .realm_clients_get(realm, Some(client_id), None, None, None, None, None)
                        .await
                }
            })
            .await
            .map_err(|e| external("find client by client ID", e))?;

        Ok(clients
            .into_iter()
            .next()
            .and_then(|client| client.id)
            .map(|id| id.to_string()))
    }

    async fn create_client(&self, template: &ClientTemplate) -> DomainResult<String> {
        let realm = self.realm();
        let representation: ClientRepresentation =
            serde_json::from_value(template.representation().clone()).map_err(|e| {
                DomainError::Serialization {
                    message: format!("Client template does not match the client schema: {e}"),
                }
            })?;

        let response = self
            .call(|admin| {
                let representation = representation.clone();
                async move { admin.realm_clients_post(realm, representation).await }
            })
            .await
            .map_err(|e| match status_of(&e) {
                Some(409) => DomainError::AlreadyExists {
                    entity: "Client".to_string(),
                    identifier: template.client_id().unwrap_or_default().to_string(),
                },
                _ => external("create client", e),
            })?;

        response
            .to_id()
            .map(|id| id.to_string())
            .ok_or_else(|| DomainError::keycloak("Failed to get client ID from response"))
    }
}
