use async_trait::async_trait;
use reqwest::header::WWW_AUTHENTICATE;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::application::ports::{config::KeycloakConfig, oidc::*};
use crate::domain::errors::OidcError;

/// Error body of the Keycloak OIDC endpoints
#[derive(Debug, Default, Deserialize)]
struct RawErrorResponse {
    error: Option<String>,
    error_description: Option<String>,
}

/// OIDC client for the realm's token, introspection and userinfo endpoints
pub struct KeycloakOidcClient {
    endpoint: String,
    client_id: String,
    client_secret: String,
    client: reqwest::Client,
}

impl KeycloakOidcClient {
    pub fn new(config: &KeycloakConfig, client: reqwest::Client) -> Self {
        Self {
            endpoint: config.oidc_url(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }

    /// Decode a successful response. A 4xx counts as a rejection only when its
    /// OAuth error code is one of `rejections`; any other refusal is reported
    /// as misconfiguration.
    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
        rejections: &[&str],
    ) -> Result<T, OidcError> {
        let status = response.status();

        if status.is_client_error() {
            let challenge = response
                .headers()
                .get(WWW_AUTHENTICATE)
                .and_then(|value| value.to_str().ok())
                .and_then(challenge_error)
                .map(str::to_string);
            let text = response.text().await.unwrap_or_default();
            let raw = serde_json::from_str::<RawErrorResponse>(&text).unwrap_or_default();

            let code = raw.error.or(challenge);
            let message = raw
                .error_description
                .or_else(|| code.clone())
                .unwrap_or(text);
            let status = status.as_u16();

            return Err(match code {
                Some(code) if rejections.contains(&code.as_str()) => {
                    OidcError::Rejected { status, message }
                }
                _ => OidcError::Misconfigured { status, message },
            });
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(OidcError::Unavailable {
                message: format!("HTTP error {}: {}", status, text),
            });
        }

        response
            .json()
            .await
            .map_err(|e| OidcError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
            })
    }
}

/// `error` parameter of a `WWW-Authenticate: Bearer ...` challenge
fn challenge_error(header: &str) -> Option<&str> {
    let params = header.trim().strip_prefix("Bearer").unwrap_or(header);
    params
        .split(',')
        .map(str::trim)
        .find_map(|param| param.strip_prefix("error="))
        .map(|value| value.trim_matches('"'))
}

fn unavailable(err: reqwest::Error) -> OidcError {
    OidcError::Unavailable {
        message: format!("HTTP request failed: {}", err),
    }
}

#[async_trait]
impl OidcPort for KeycloakOidcClient {
    async fn token(&self, username: &str, password: &str) -> Result<TokenSet, OidcError> {
        debug!("Requesting token for '{}'", username);

        let response = self
            .client
            .post(self.url("token"))
            .form(&[
                ("grant_type", "password"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("username", username),
                ("password", password),
                ("scope", "openid"),
            ])
            .send()
            .await
            .map_err(unavailable)?;

        Self::read_json(response, &["invalid_grant"]).await
    }

    async fn introspect(&self, access_token: &str) -> Result<TokenIntrospection, OidcError> {
        let response = self
            .client
            .post(self.url("token/introspect"))
            .form(&[
                ("token", access_token),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(unavailable)?;

        Self::read_json(response, &["invalid_token"]).await
    }

    async fn userinfo(&self, access_token: &str) -> Result<UserInfo, OidcError> {
        let response = self
            .client
            .get(self.url("userinfo"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(unavailable)?;

        Self::read_json(response, &["invalid_token"]).await
    }
}
