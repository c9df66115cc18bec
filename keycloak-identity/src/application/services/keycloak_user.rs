use crate::{
    application::ports::*,
    domain::{
        entities::*,
        errors::{DomainError, DomainResult, OidcError},
    },
};
use tracing::{debug, error, info, instrument, warn};

/// A user of the configured realm, backed by the identity provider.
///
/// `user_id` is set exactly when the user was created or looked up remotely.
/// Nothing is cached: every constructor re-reads the remote record. The
/// password is only kept in memory for the lifetime of this value.
pub struct KeycloakUser {
    identity: IdentityProvider,
    user_id: Option<String>,
    username: String,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    password: Option<String>,
}

impl KeycloakUser {
    fn blank(identity: &IdentityProvider, username: &str) -> Self {
        Self {
            identity: identity.clone(),
            user_id: None,
            username: username.to_string(),
            email: None,
            first_name: None,
            last_name: None,
            password: None,
        }
    }

    /// Register a new user; fails with `AlreadyExists` if the username resolves.
    #[instrument(skip(identity, password, email, first_name, last_name))]
    pub async fn create_new(
        identity: &IdentityProvider,
        username: &str,
        password: &str,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> DomainResult<Self> {
        if identity.admin().find_user_id(username).await?.is_some() {
            return Err(DomainError::AlreadyExists {
                entity: "User".to_string(),
                identifier: username.to_string(),
            });
        }

        let mut user = Self::blank(identity, username);
        user.password = Some(password.to_string());
        user.email = Some(email.to_string());
        user.first_name = Some(first_name.to_string());
        user.last_name = Some(last_name.to_string());

        user.register().await
    }

    /// Look up an existing user by username and load its details.
    #[instrument(skip(identity))]
    pub async fn from_username(identity: &IdentityProvider, username: &str) -> DomainResult<Self> {
        let user_id = identity
            .admin()
            .find_user_id(username)
            .await?
            .ok_or_else(|| DomainError::user_not_found(username))?;

        let mut user = Self::blank(identity, username);
        user.user_id = Some(user_id);
        user.load_details().await?;

        Ok(user)
    }

    /// Load an existing user directly by id.
    #[instrument(skip(identity))]
    pub async fn from_user_id(identity: &IdentityProvider, user_id: &str) -> DomainResult<Self> {
        let mut user = Self::blank(identity, "");
        user.user_id = Some(user_id.to_string());
        user.load_details().await?;

        Ok(user)
    }

    /// Return the existing user, or create it when every creation field is supplied.
    ///
    /// The optional fields are ignored when the username already resolves.
    #[instrument(skip(identity, password, email, first_name, last_name))]
    pub async fn get_or_create(
        identity: &IdentityProvider,
        username: &str,
        password: Option<&str>,
        email: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> DomainResult<Self> {
        let mut user = Self::blank(identity, username);

        if let Some(user_id) = identity.admin().find_user_id(username).await? {
            user.user_id = Some(user_id);
            user.load_details().await?;
            return Ok(user);
        }

        let supplied = |value: Option<&str>| value.filter(|v| !v.is_empty()).map(str::to_string);
        let fields = [
            ("password", supplied(password)),
            ("email", supplied(email)),
            ("first_name", supplied(first_name)),
            ("last_name", supplied(last_name)),
        ];

        let missing: Vec<String> = fields
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(DomainError::MissingFields { fields: missing });
        }

        let [(_, password), (_, email), (_, first_name), (_, last_name)] = fields;
        user.password = password;
        user.email = email;
        user.first_name = first_name;
        user.last_name = last_name;

        user.register().await
    }

    async fn register(mut self) -> DomainResult<Self> {
        let payload = NewUser::registration(
            self.username.clone(),
            self.password.clone().unwrap_or_default(),
            self.email.clone().unwrap_or_default(),
            self.first_name.clone().unwrap_or_default(),
            self.last_name.clone().unwrap_or_default(),
        );

        let user_id = self.identity.admin().create_user(&payload).await?;
        info!("Created user '{}' with ID '{}'", self.username, user_id);

        self.user_id = Some(user_id);
        Ok(self)
    }

    async fn load_details(&mut self) -> DomainResult<()> {
        let user_id = self.require_id()?.to_string();
        let profile = self.identity.admin().get_user(&user_id).await?;

        self.username = profile.username;
        self.email = profile.email;
        self.first_name = profile.first_name;
        self.last_name = profile.last_name;
        Ok(())
    }

    fn require_id(&self) -> DomainResult<&str> {
        self.user_id
            .as_deref()
            .ok_or_else(|| DomainError::NotInitialized {
                reason: "User ID not set".to_string(),
            })
    }

    /// Update email, first and last name. Unset and empty values are ignored.
    ///
    /// Returns whether a remote update was issued.
    #[instrument(skip(self, update), fields(username = %self.username))]
    pub async fn update(&mut self, update: UserUpdate) -> DomainResult<bool> {
        let user_id = self.require_id()?.to_string();

        let update = update.effective();
        if update.is_empty() {
            debug!("No profile changes for '{}'", self.username);
            return Ok(false);
        }

        self.identity.admin().update_user(&user_id, &update).await?;

        if let Some(email) = update.email {
            self.email = Some(email);
        }
        if let Some(first_name) = update.first_name {
            self.first_name = Some(first_name);
        }
        if let Some(last_name) = update.last_name {
            self.last_name = Some(last_name);
        }

        info!("Updated profile of '{}'", self.username);
        Ok(true)
    }

    /// Delete the remote user and forget its id.
    #[instrument(skip(self), fields(username = %self.username))]
    pub async fn delete(&mut self) -> DomainResult<()> {
        let user_id = self.require_id()?.to_string();

        self.identity.admin().delete_user(&user_id).await?;
        self.user_id = None;

        info!("Deleted user '{}' ({})", self.username, user_id);
        Ok(())
    }

    /// Set a non-temporary password.
    #[instrument(skip(self, password), fields(username = %self.username))]
    pub async fn set_password(&mut self, password: &str) -> DomainResult<()> {
        let user_id = self.require_id()?.to_string();

        self.identity
            .admin()
            .set_user_password(&user_id, password, false)
            .await?;
        self.password = Some(password.to_string());

        Ok(())
    }

    /// Request a token with the given password, or the one held in memory.
    ///
    /// A failed grant is logged and reported as `Ok(None)`.
    #[instrument(skip(self, password), fields(username = %self.username))]
    pub async fn get_token(&self, password: Option<&str>) -> DomainResult<Option<TokenSet>> {
        if self.username.is_empty() {
            return Err(DomainError::NotInitialized {
                reason: "Username not set".to_string(),
            });
        }

        let password = password
            .filter(|p| !p.is_empty())
            .or(self.password.as_deref())
            .ok_or(DomainError::MissingPassword)?;

        match self.identity.oidc().token(&self.username, password).await {
            Ok(token) => Ok(Some(token)),
            Err(err) => {
                log_soft_failure("token request", &self.username, &err);
                Ok(None)
            }
        }
    }

    /// Whether the provider still considers `access_token` active.
    pub async fn check_token(&self, access_token: &str) -> DomainResult<bool> {
        let info = self.identity.oidc().introspect(access_token).await?;
        Ok(info.active)
    }

    /// Userinfo claims for `access_token`; failures are logged and yield `None`.
    pub async fn get_userinfo(&self, access_token: &str) -> Option<UserInfo> {
        match self.identity.oidc().userinfo(access_token).await {
            Ok(info) => Some(info),
            Err(err) => {
                log_soft_failure("userinfo request", &self.username, &err);
                None
            }
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn first_name(&self) -> Option<&str> {
        self.first_name.as_deref()
    }

    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    pub fn is_initialized(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn as_summary(&self) -> DomainResult<UserSummary> {
        Ok(UserSummary {
            user_id: self.require_id()?.to_string(),
            username: self.username.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        })
    }
}

impl std::fmt::Debug for KeycloakUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeycloakUser")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish_non_exhaustive()
    }
}

// Rejections are routine (wrong password); anything else needs an operator.
fn log_soft_failure(operation: &str, username: &str, err: &OidcError) {
    if err.is_rejection() {
        warn!("{} for '{}' rejected: {}", operation, username, err);
    } else {
        error!("{} for '{}' failed: {}", operation, username, err);
    }
}
