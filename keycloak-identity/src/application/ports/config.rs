use crate::domain::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Keycloak server and realm configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct KeycloakConfig {
    pub url: String,
    pub realm: String,
    pub admin_username: String,
    pub admin_password: String,
    pub admin_client_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub client_template_path: Option<PathBuf>,
}

impl KeycloakConfig {
    /// Read the configuration through `lookup`, usually backed by the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            url: lookup("KEYCLOAK_URL").unwrap_or_else(|| "http://keycloak:7080".to_string()),
            realm: lookup("KEYCLOAK_REALM").unwrap_or_else(|| "master".to_string()),
            admin_username: lookup("KEYCLOAK_ADMIN_USERNAME")
                .unwrap_or_else(|| "admin".to_string()),
            admin_password: lookup("KEYCLOAK_ADMIN_PASSWORD")
                .unwrap_or_else(|| "admin".to_string()),
            admin_client_id: lookup("KEYCLOAK_ADMIN_CLIENT_ID")
                .unwrap_or_else(|| "admin-cli".to_string()),
            client_id: lookup("OIDC_CLIENT_ID").unwrap_or_else(|| "app".to_string()),
            client_secret: lookup("OIDC_CLIENT_SECRET").ok_or_else(|| {
                ConfigError::MissingRequired {
                    key: "OIDC_CLIENT_SECRET".to_string(),
                }
            })?,
            client_template_path: lookup("OIDC_CLIENT_TEMPLATE").map(PathBuf::from),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_empty() {
            return Err(ConfigError::MissingRequired {
                key: "KEYCLOAK_URL".to_string(),
            });
        }

        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "KEYCLOAK_URL".to_string(),
                message: "Must start with http:// or https://".to_string(),
            });
        }

        let required = [
            ("KEYCLOAK_REALM", &self.realm),
            ("KEYCLOAK_ADMIN_USERNAME", &self.admin_username),
            ("KEYCLOAK_ADMIN_PASSWORD", &self.admin_password),
            ("KEYCLOAK_ADMIN_CLIENT_ID", &self.admin_client_id),
            ("OIDC_CLIENT_ID", &self.client_id),
            ("OIDC_CLIENT_SECRET", &self.client_secret),
        ];
        if let Some((key, _)) = required.iter().find(|(_, value)| value.is_empty()) {
            return Err(ConfigError::MissingRequired {
                key: key.to_string(),
            });
        }

        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Base of the realm's OpenID Connect endpoints
    pub fn oidc_url(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect",
            self.base_url(),
            self.realm
        )
    }
}

impl std::fmt::Debug for KeycloakConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeycloakConfig")
            .field("url", &self.url)
            .field("realm", &self.realm)
            .field("admin_username", &self.admin_username)
            .field("admin_password", &REDACTED)
            .field("admin_client_id", &self.admin_client_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &REDACTED)
            .field("client_template_path", &self.client_template_path)
            .finish()
    }
}

/// Placeholder printed instead of secrets
pub const REDACTED: &str = "[REDACTED]";

/// Outbound HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            connect_timeout_seconds: 10,
        }
    }
}

impl HttpConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            timeout_seconds: parse_or(&lookup, "HTTP_TIMEOUT_SECONDS", defaults.timeout_seconds)?,
            connect_timeout_seconds: parse_or(
                &lookup,
                "HTTP_CONNECT_TIMEOUT_SECONDS",
                defaults.connect_timeout_seconds,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                key: "HTTP_TIMEOUT_SECONDS".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if self.connect_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                key: "HTTP_CONNECT_TIMEOUT_SECONDS".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    pub fn get_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn get_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Shared client for every outbound call to the identity provider
    pub fn build_client(&self) -> Result<reqwest::Client, ConfigError> {
        reqwest::Client::builder()
            .timeout(self.get_timeout())
            .connect_timeout(self.get_connect_timeout())
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                key: "HTTP_TIMEOUT_SECONDS".to_string(),
                message: format!("Cannot build HTTP client: {e}"),
            })
    }
}

/// Parse an optional value, falling back to `default` when unset.
pub fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}
