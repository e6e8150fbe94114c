//! OAuth refresh-token grant against the identity provider's token endpoint.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use super::TokenRefresher;
use crate::config::OAuthConfig;
use crate::error::{CredentialError, Error, Result};
use crate::types::Credential;

/// [`TokenRefresher`] that posts a `refresh_token` grant to the configured token URL
pub struct OAuthTokenRefresher {
    client: reqwest::Client,
    config: OAuthConfig,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl OAuthTokenRefresher {
    /// Create a refresher with its own HTTP client
    pub fn new(config: OAuthConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Create a refresher that reuses an existing HTTP client
    pub fn with_client(client: reqwest::Client, config: OAuthConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl TokenRefresher for OAuthTokenRefresher {
    async fn refresh(&self, credential: &Credential) -> Result<Credential> {
        let refresh_token = credential
            .refresh_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(Error::Credential(CredentialError::MissingRefreshToken))?;

        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => body,
            };
            return Err(Error::Credential(CredentialError::RefreshRejected {
                status: status.as_u16(),
                reason,
            }));
        }

        let token: TokenResponse = response.json().await?;
        let expiry = token
            .expires_in
            .map(|secs| Utc::now() + chrono::Duration::seconds(secs));

        Ok(Credential {
            access_token: token.access_token,
            // providers usually omit the refresh token on renewal
            refresh_token: token
                .refresh_token
                .or_else(|| credential.refresh_token.clone()),
            expiry,
        })
    }
}
