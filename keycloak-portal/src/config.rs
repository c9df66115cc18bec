use axum_extra::extract::cookie::Key;
use keycloak_identity::{parse_or, ConfigError, HttpConfig, KeycloakConfig, REDACTED};
use sha2::{Digest, Sha512};

#[derive(Clone)]
pub struct Config {
    pub keycloak: KeycloakConfig,
    pub http: HttpConfig,
    pub secret_key: String,
    pub port: u16,
    pub secure_cookies: bool,
}

impl Config {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret_key = lookup("SECRET_KEY")
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigError::MissingRequired {
                key: "SECRET_KEY".to_string(),
            })?;

        Ok(Self {
            keycloak: KeycloakConfig::from_lookup(&lookup)?,
            http: HttpConfig::from_lookup(&lookup)?,
            secret_key,
            port: parse_or(&lookup, "PORT", 3000)?,
            secure_cookies: parse_or(&lookup, "SECURE_COOKIES", false)?,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Cookie signing and encryption key derived from `SECRET_KEY`
    pub fn cookie_key(&self) -> Key {
        Key::from(Sha512::digest(self.secret_key.as_bytes()).as_slice())
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("keycloak", &self.keycloak)
            .field("http", &self.http)
            .field("secret_key", &REDACTED)
            .field("port", &self.port)
            .field("secure_cookies", &self.secure_cookies)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn secret_key_is_required() {
        let err = Config::from_lookup(lookup(&[("OIDC_CLIENT_SECRET", "s")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired { key } if key == "SECRET_KEY"));
    }

    #[test]
    fn defaults() {
        let config = Config::from_lookup(lookup(&[
            ("OIDC_CLIENT_SECRET", "s"),
            ("SECRET_KEY", "dev"),
        ]))
        .unwrap();

        assert_eq!(config.port, 3000);
        assert!(!config.secure_cookies);
        assert_eq!(config.keycloak.realm, "master");
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("OIDC_CLIENT_SECRET", "s"),
            ("SECRET_KEY", "dev"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "PORT"));
    }

    #[test]
    fn debug_output_hides_secret_key() {
        let config = Config::from_lookup(lookup(&[
            ("OIDC_CLIENT_SECRET", "client-s3cret"),
            ("SECRET_KEY", "cookie-s3cret"),
        ]))
        .unwrap();

        let debug = format!("{config:?}");
        assert!(!debug.contains("cookie-s3cret"));
        assert!(!debug.contains("client-s3cret"));
        assert!(debug.contains("port: 3000"));
    }

    #[test]
    fn cookie_key_is_stable_per_secret() {
        let a = Config::from_lookup(lookup(&[("OIDC_CLIENT_SECRET", "s"), ("SECRET_KEY", "one")])).unwrap();
        let b = Config::from_lookup(lookup(&[("OIDC_CLIENT_SECRET", "s"), ("SECRET_KEY", "one")])).unwrap();
        let c = Config::from_lookup(lookup(&[("OIDC_CLIENT_SECRET", "s"), ("SECRET_KEY", "two")])).unwrap();

        assert_eq!(a.cookie_key().master(), b.cookie_key().master());
        assert_ne!(a.cookie_key().master(), c.cookie_key().master());
    }
}
