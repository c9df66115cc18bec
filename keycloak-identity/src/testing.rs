//! In-memory identity provider for tests.
//!
//! Implements both ports against a process-local store and records the calls
//! made through it, so services and pages can be exercised without Keycloak.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::application::ports::*;
use crate::domain::{
    entities::*,
    errors::{DomainError, DomainResult, OidcError},
};

#[derive(Debug, Clone)]
struct StoredUser {
    profile: UserProfile,
    password: Option<String>,
    realm_roles: Vec<String>,
}

#[derive(Debug, Default)]
struct State {
    users: HashMap<String, StoredUser>,
    clients: HashMap<String, String>,
    tokens: HashMap<String, String>,
    created_users: Vec<NewUser>,
    updates: Vec<UserUpdate>,
    created_clients: Vec<ClientTemplate>,
    fail_admin: bool,
    fail_oidc: bool,
    fail_client_creation: bool,
}

impl State {
    fn user_id_by_username(&self, username: &str) -> Option<String> {
        self.users
            .values()
            .find(|user| usernames_match(&user.profile.username, username))
            .map(|user| user.profile.id.clone())
    }

    fn check_admin(&self) -> DomainResult<()> {
        if self.fail_admin {
            return Err(DomainError::keycloak("Mock failure enabled"));
        }
        Ok(())
    }

    fn check_oidc(&self) -> Result<(), OidcError> {
        if self.fail_oidc {
            return Err(OidcError::Unavailable {
                message: "Mock failure enabled".to_string(),
            });
        }
        Ok(())
    }
}

/// Identity provider double backed by a mutex-guarded map
#[derive(Debug, Default)]
pub struct InMemoryIdentityProvider {
    state: Mutex<State>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Bundle this double as both ports.
    pub fn provider(self: &Arc<Self>) -> IdentityProvider {
        IdentityProvider::new(self.clone(), self.clone())
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store a user directly, bypassing the recorded create calls. Returns its id.
    pub fn seed_user(
        &self,
        username: &str,
        password: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        let user = StoredUser {
            profile: UserProfile {
                id: id.clone(),
                username: username.to_lowercase(),
                email: Some(email.to_string()),
                first_name: Some(first_name.to_string()),
                last_name: Some(last_name.to_string()),
            },
            password: Some(password.to_string()),
            realm_roles: vec![DEFAULT_REALM_ROLE.to_string()],
        };
        self.state().users.insert(id.clone(), user);
        id
    }

    pub fn seed_client(&self, client_id: &str) -> String {
        let id = Uuid::new_v4().to_string();
        self.state().clients.insert(client_id.to_string(), id.clone());
        id
    }

    /// Make every admin operation fail with an external service error.
    pub fn set_fail_admin(&self, fail: bool) {
        self.state().fail_admin = fail;
    }

    /// Make every OIDC operation fail as if the provider were down.
    pub fn set_fail_oidc(&self, fail: bool) {
        self.state().fail_oidc = fail;
    }

    pub fn set_fail_client_creation(&self, fail: bool) {
        self.state().fail_client_creation = fail;
    }

    /// Forget every issued token, as if their sessions ended.
    pub fn revoke_tokens(&self) {
        self.state().tokens.clear();
    }

    pub fn create_calls(&self) -> usize {
        self.state().created_users.len()
    }

    pub fn created_users(&self) -> Vec<NewUser> {
        self.state().created_users.clone()
    }

    pub fn update_calls(&self) -> Vec<UserUpdate> {
        self.state().updates.clone()
    }

    pub fn created_clients(&self) -> Vec<ClientTemplate> {
        self.state().created_clients.clone()
    }

    pub fn user(&self, user_id: &str) -> Option<UserProfile> {
        self.state().users.get(user_id).map(|user| user.profile.clone())
    }

    pub fn password_of(&self, user_id: &str) -> Option<String> {
        self.state()
            .users
            .get(user_id)
            .and_then(|user| user.password.clone())
    }

    pub fn realm_roles_of(&self, user_id: &str) -> Vec<String> {
        self.state()
            .users
            .get(user_id)
            .map(|user| user.realm_roles.clone())
            .unwrap_or_default()
    }

    pub fn user_count(&self) -> usize {
        self.state().users.len()
    }
}

#[async_trait]
impl IdentityAdminPort for InMemoryIdentityProvider {
    async fn find_user_id(&self, username: &str) -> DomainResult<Option<String>> {
        let state = self.state();
        state.check_admin()?;
        Ok(state.user_id_by_username(username))
    }

    async fn get_user(&self, user_id: &str) -> DomainResult<UserProfile> {
        let state = self.state();
        state.check_admin()?;
        state
            .users
            .get(user_id)
            .map(|user| user.profile.clone())
            .ok_or_else(|| DomainError::user_not_found(user_id))
    }

    async fn create_user(&self, user: &NewUser) -> DomainResult<String> {
        let mut state = self.state();
        state.check_admin()?;
        state.created_users.push(user.clone());

        if state.user_id_by_username(&user.username).is_some() {
            return Err(DomainError::AlreadyExists {
                entity: "User".to_string(),
                identifier: user.username.clone(),
            });
        }

        let id = Uuid::new_v4().to_string();
        let stored = StoredUser {
            profile: UserProfile {
                id: id.clone(),
                username: user.username.to_lowercase(),
                email: Some(user.email.clone()),
                first_name: Some(user.first_name.clone()),
                last_name: Some(user.last_name.clone()),
            },
            password: user.credentials.first().map(|c| c.value.clone()),
            realm_roles: user.realm_roles.clone(),
        };
        state.users.insert(id.clone(), stored);
        Ok(id)
    }

    async fn update_user(&self, user_id: &str, update: &UserUpdate) -> DomainResult<()> {
        let mut state = self.state();
        state.check_admin()?;
        state.updates.push(update.clone());

        let user = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| DomainError::user_not_found(user_id))?;
        if let Some(email) = &update.email {
            user.profile.email = Some(email.clone());
        }
        if let Some(first_name) = &update.first_name {
            user.profile.first_name = Some(first_name.clone());
        }
        if let Some(last_name) = &update.last_name {
            user.profile.last_name = Some(last_name.clone());
        }
        Ok(())
    }

    async fn set_user_password(
        &self,
        user_id: &str,
        password: &str,
        _temporary: bool,
    ) -> DomainResult<()> {
        let mut state = self.state();
        state.check_admin()?;
        let user = state
            .users
            .get_mut(user_id)
            .ok_or_else(|| DomainError::user_not_found(user_id))?;
        user.password = Some(password.to_string());
        Ok(())
    }

    async fn delete_user(&self, user_id: &str) -> DomainResult<()> {
        let mut state = self.state();
        state.check_admin()?;
        state
            .users
            .remove(user_id)
            .ok_or_else(|| DomainError::user_not_found(user_id))?;
        state.tokens.retain(|_, owner| owner != user_id);
        Ok(())
    }

    async fn find_client(&self, client_id: &str) -> DomainResult<Option<String>> {
        let state = self.state();
        state.check_admin()?;
        Ok(state.clients.get(client_id).cloned())
    }

    async fn create_client(&self, template: &ClientTemplate) -> DomainResult<String> {
        let mut state = self.state();
        state.check_admin()?;
        state.created_clients.push(template.clone());

        if state.fail_client_creation {
            return Err(DomainError::keycloak("Client creation refused"));
        }

        let client_id = template.client_id().unwrap_or_default().to_string();
        if state.clients.contains_key(&client_id) {
            return Err(DomainError::AlreadyExists {
                entity: "Client".to_string(),
                identifier: client_id,
            });
        }

        let id = Uuid::new_v4().to_string();
        state.clients.insert(client_id, id.clone());
        Ok(id)
    }
}

#[async_trait]
impl OidcPort for InMemoryIdentityProvider {
    async fn token(&self, username: &str, password: &str) -> Result<TokenSet, OidcError> {
        let mut state = self.state();
        state.check_oidc()?;

        let user_id = state
            .user_id_by_username(username)
            .filter(|id| {
                state
                    .users
                    .get(id)
                    .and_then(|user| user.password.as_deref())
                    == Some(password)
            })
            .ok_or_else(|| OidcError::Rejected {
                status: 401,
                message: "Invalid user credentials".to_string(),
            })?;

        let access_token = format!("token-{}", Uuid::new_v4());
        state.tokens.insert(access_token.clone(), user_id);

        Ok(TokenSet {
            access_token,
            expires_in: 300,
            refresh_token: Some(format!("refresh-{}", Uuid::new_v4())),
            refresh_expires_in: Some(1800),
            id_token: None,
            token_type: "Bearer".to_string(),
            scope: Some("openid profile email".to_string()),
            session_state: None,
        })
    }

    async fn introspect(&self, access_token: &str) -> Result<TokenIntrospection, OidcError> {
        let state = self.state();
        state.check_oidc()?;

        let Some(user) = state
            .tokens
            .get(access_token)
            .and_then(|id| state.users.get(id))
        else {
            return Ok(TokenIntrospection::default());
        };

        Ok(TokenIntrospection {
            active: true,
            username: Some(user.profile.username.clone()),
            sub: Some(user.profile.id.clone()),
            token_type: Some("Bearer".to_string()),
            ..Default::default()
        })
    }

    async fn userinfo(&self, access_token: &str) -> Result<UserInfo, OidcError> {
        let state = self.state();
        state.check_oidc()?;

        let user = state
            .tokens
            .get(access_token)
            .and_then(|id| state.users.get(id))
            .ok_or_else(|| OidcError::Rejected {
                status: 401,
                message: "Token verification failed".to_string(),
            })?;

        let profile = &user.profile;
        let name = match (&profile.first_name, &profile.last_name) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            _ => None,
        };

        Ok(UserInfo {
            sub: profile.id.clone(),
            preferred_username: Some(profile.username.clone()),
            email: profile.email.clone(),
            email_verified: Some(true),
            name,
            given_name: profile.first_name.clone(),
            family_name: profile.last_name.clone(),
            other: HashMap::new(),
        })
    }
}
