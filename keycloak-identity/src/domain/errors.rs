use thiserror::Error;

/// Domain-specific errors for identity operations
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{entity} not found: {identifier}")]
    NotFound { entity: String, identifier: String },

    #[error("{entity} already exists: {identifier}")]
    AlreadyExists { entity: String, identifier: String },

    #[error("User not initialized: {reason}")]
    NotInitialized { reason: String },

    #[error("Missing required fields for user creation: {}", fields.join(", "))]
    MissingFields { fields: Vec<String> },

    #[error("Password required for token generation")]
    MissingPassword,

    #[error("External service error: {service} - {message}")]
    ExternalService { service: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl DomainError {
    pub fn user_not_found(identifier: impl Into<String>) -> Self {
        DomainError::NotFound {
            entity: "User".to_string(),
            identifier: identifier.into(),
        }
    }

    pub fn keycloak(message: impl Into<String>) -> Self {
        DomainError::ExternalService {
            service: "Keycloak".to_string(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::NotFound { .. })
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Errors reported by the OIDC capability of the identity provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OidcError {
    /// The provider answered and refused the request (bad credentials, inactive token).
    #[error("Request rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The provider refused the request because of deployment settings such
    /// as a wrong realm or client secret, not because of user input.
    #[error("Request refused with status {status}: {message}")]
    Misconfigured { status: u16, message: String },

    /// The provider could not be reached or failed on its side.
    #[error("Identity provider unavailable: {message}")]
    Unavailable { message: String },

    #[error("Invalid response from identity provider: {message}")]
    InvalidResponse { message: String },
}

impl OidcError {
    /// Whether the failure is an answer from the provider rather than an outage.
    pub fn is_rejection(&self) -> bool {
        matches!(self, OidcError::Rejected { .. })
    }
}

impl From<OidcError> for DomainError {
    fn from(err: OidcError) -> Self {
        match err {
            OidcError::Rejected { status, message } => DomainError::ExternalService {
                service: "Keycloak OIDC".to_string(),
                message: format!("HTTP {status}: {message}"),
            },
            OidcError::Misconfigured { status, message } => DomainError::ExternalService {
                service: "Keycloak OIDC".to_string(),
                message: format!("HTTP {status}: {message}"),
            },
            OidcError::Unavailable { message } => DomainError::ExternalService {
                service: "Keycloak OIDC".to_string(),
                message,
            },
            OidcError::InvalidResponse { message } => DomainError::Serialization { message },
        }
    }
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}")]
    MissingRequired { key: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Configuration file error: {message}")]
    FileError { message: String },
}

impl From<ConfigError> for DomainError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::MissingRequired { key } => DomainError::Configuration {
                message: format!("Missing required configuration: {key}"),
            },
            ConfigError::InvalidValue { key, message } => DomainError::Configuration {
                message: format!("Invalid value for {key}: {message}"),
            },
            ConfigError::FileError { message } => DomainError::Configuration { message },
        }
    }
}
