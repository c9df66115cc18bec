use crate::domain::errors::OidcError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Token endpoint response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: i64,
    pub refresh_token: Option<String>,
    pub refresh_expires_in: Option<i64>,
    pub id_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub scope: Option<String>,
    pub session_state: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Token introspection response (RFC 7662)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenIntrospection {
    #[serde(default)]
    pub active: bool,
    pub username: Option<String>,
    pub client_id: Option<String>,
    pub sub: Option<String>,
    pub scope: Option<String>,
    pub token_type: Option<String>,
    pub exp: Option<i64>,
    pub iat: Option<i64>,
    pub iss: Option<String>,
    /// Either a single audience or a list of them
    pub aud: Option<Value>,
}

/// Claims returned by the userinfo endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub sub: String,
    pub preferred_username: Option<String>,
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    #[serde(flatten)]
    pub other: HashMap<String, Value>,
}

/// OIDC client capability of the identity provider
#[async_trait]
pub trait OidcPort: Send + Sync {
    /// Resource owner password grant
    async fn token(&self, username: &str, password: &str) -> Result<TokenSet, OidcError>;

    async fn introspect(&self, access_token: &str) -> Result<TokenIntrospection, OidcError>;

    async fn userinfo(&self, access_token: &str) -> Result<UserInfo, OidcError>;
}
