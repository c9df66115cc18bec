use crate::domain::errors::{ConfigError, DomainError, DomainResult};
use serde_json::Value;
use std::path::Path;

const BUILTIN_TEMPLATE: &str = include_str!("../../../config/oidc_client.json");

/// Static client registration template submitted when the OIDC client is missing
#[derive(Debug, Clone, PartialEq)]
pub struct ClientTemplate {
    representation: Value,
}

impl ClientTemplate {
    /// Parse a client representation; it must be a JSON object.
    pub fn from_json_str(raw: &str) -> DomainResult<Self> {
        let representation: Value =
            serde_json::from_str(raw).map_err(|e| DomainError::Serialization {
                message: format!("Invalid client template: {e}"),
            })?;

        if !representation.is_object() {
            return Err(DomainError::Serialization {
                message: "Client template must be a JSON object".to_string(),
            });
        }

        Ok(Self { representation })
    }

    /// The template compiled into the crate
    pub fn builtin() -> DomainResult<Self> {
        Self::from_json_str(BUILTIN_TEMPLATE)
    }

    /// Load from a file when a path is configured, otherwise use the builtin template.
    pub fn load(path: Option<&Path>) -> DomainResult<Self> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::FileError {
                    message: format!("Cannot read client template {}: {e}", path.display()),
                })?;
                Self::from_json_str(&raw)
            }
            None => Self::builtin(),
        }
    }

    /// Overwrite the client id and secret with the configured values.
    pub fn with_credentials(mut self, client_id: &str, secret: &str) -> Self {
        if let Some(object) = self.representation.as_object_mut() {
            object.insert("clientId".to_string(), Value::String(client_id.to_string()));
            object.insert("secret".to_string(), Value::String(secret.to_string()));
        }
        self
    }

    pub fn client_id(&self) -> Option<&str> {
        self.representation.get("clientId").and_then(Value::as_str)
    }

    pub fn representation(&self) -> &Value {
        &self.representation
    }
}
