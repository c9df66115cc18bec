use serde::{Deserialize, Serialize};

/// Realm role every self-registered user receives
pub const DEFAULT_REALM_ROLE: &str = "user";

/// Usernames compare the way Keycloak stores them: lower-cased with full
/// Unicode rules.
pub fn usernames_match(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// User record as stored by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Serializable projection of a user kept in the browser session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub user_id: String,
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl UserSummary {
    /// Full name when available, username otherwise
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.username.clone(),
        }
    }
}

/// Password credential attached to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordCredential {
    pub value: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub temporary: bool,
}

impl PasswordCredential {
    pub fn permanent(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            type_: "password".to_string(),
            temporary: false,
        }
    }
}

/// Payload for registering a new user with the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub credentials: Vec<PasswordCredential>,
    pub enabled: bool,
    pub realm_roles: Vec<String>,
    pub first_name: String,
    pub last_name: String,
    pub email_verified: bool,
}

impl NewUser {
    /// Self-registration payload: enabled, pre-verified email, default role
    /// and a non-temporary password.
    pub fn registration(
        username: impl Into<String>,
        password: impl Into<String>,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            username: username.into(),
            credentials: vec![PasswordCredential::permanent(password)],
            enabled: true,
            realm_roles: vec![DEFAULT_REALM_ROLE.to_string()],
            first_name: first_name.into(),
            last_name: last_name.into(),
            email_verified: true,
        }
    }
}

/// Partial update of the mutable profile fields
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl UserUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }

    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    /// Drop unset and empty values, keeping only the fields that change something.
    pub fn effective(&self) -> Self {
        fn keep(value: &Option<String>) -> Option<String> {
            value.as_ref().filter(|v| !v.is_empty()).cloned()
        }

        Self {
            email: keep(&self.email),
            first_name: keep(&self.first_name),
            last_name: keep(&self.last_name),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.first_name.is_none() && self.last_name.is_none()
    }
}
