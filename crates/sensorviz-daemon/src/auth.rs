//! Bearer token retrieval for the viewer renderer
//!
//! The token endpoint returns `{"access_token": "..."}`. Failures are not
//! retried; they propagate to session setup and abort it.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::AuthConfig;

/// Opaque bearer token handed to the renderer
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Token endpoint response body
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Extract the access token from a token endpoint body
pub fn parse_token_response(body: &str) -> Result<AccessToken> {
    let response: TokenResponse =
        serde_json::from_str(body).context("Malformed token response")?;
    if response.access_token.is_empty() {
        bail!("Token endpoint returned an empty access_token");
    }
    Ok(AccessToken::new(response.access_token))
}

/// Fetches access tokens from the configured endpoint
pub struct TokenFetcher {
    client: reqwest::Client,
    url: String,
}

impl TokenFetcher {
    /// Create a fetcher, or `None` when no token URL is configured
    pub fn from_config(config: &AuthConfig) -> Result<Option<Self>> {
        let Some(url) = config.token_url.clone() else {
            return Ok(None);
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Some(Self { client, url }))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch a fresh token
    pub async fn fetch(&self) -> Result<AccessToken> {
        debug!(url = %self.url, "Fetching access token");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Token request to {} failed", self.url))?;

        if !response.status().is_success() {
            bail!(
                "Token endpoint {} returned HTTP {}",
                self.url,
                response.status()
            );
        }

        let body = response.text().await.context("Failed to read token response")?;
        let token = parse_token_response(&body)?;
        info!(url = %self.url, "Access token acquired");
        Ok(token)
    }
}
