// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth client: consent URL and authorization-code exchange.
//!
//! Handlers only see the [`IdentityProvider`] trait, so tests (or another
//! provider) can stand in without touching route code.

use crate::config::Config;
use crate::models::Profile;
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const SCOPES: &str = "openid email profile";

/// Provider endpoints. Overridable so the client can be pointed at a local
/// server in tests.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub authorize: String,
    pub token: String,
    pub userinfo: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            authorize: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token: "https://oauth2.googleapis.com/token".to_string(),
            userinfo: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
        }
    }
}

/// Identity provider failure categories.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The provider answered with a non-success status.
    #[error("identity provider returned HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
    /// Network or decoding failure talking to the provider.
    #[error("identity provider request failed: {0}")]
    Transport(String),
}

/// The one capability the login flow needs from an OAuth provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL of the provider's consent page.
    fn authorize_url(&self, state: &str, redirect_uri: &str) -> String;

    /// Exchange an authorization code for the user's profile.
    async fn exchange_code_for_profile(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<Profile, IdentityError>;
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Google implementation of [`IdentityProvider`].
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    endpoints: GoogleEndpoints,
}

impl GoogleOAuthClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Self::with_endpoints(config, GoogleEndpoints::default())
    }

    pub fn with_endpoints(config: &Config, endpoints: GoogleEndpoints) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .context("failed building OAuth HTTP client")?;

        tracing::info!(
            client_id = %config.google_client_id,
            redirect_uri = %config.oauth_redirect_uri(),
            "Initialized Google OAuth client"
        );

        Ok(Self {
            http,
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            endpoints,
        })
    }

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<String, IdentityError> {
        let response = self
            .http
            .post(&self.endpoints.token)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| IdentityError::Transport(format!("token exchange: {}", e)))?;

        let token: TokenResponse = check_response_json(response).await?;
        Ok(token.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<Profile, IdentityError> {
        let response = self
            .http
            .get(&self.endpoints.userinfo)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| IdentityError::Transport(format!("userinfo: {}", e)))?;

        check_response_json(response).await
    }
}

#[async_trait]
impl IdentityProvider for GoogleOAuthClient {
    fn authorize_url(&self, state: &str, redirect_uri: &str) -> String {
        format!(
            "{}?\
             client_id={}&\
             redirect_uri={}&\
             response_type=code&\
             scope={}&\
             access_type=online&\
             state={}",
            self.endpoints.authorize,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state),
        )
    }

    async fn exchange_code_for_profile(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<Profile, IdentityError> {
        let access_token = self.exchange_code(code, redirect_uri).await?;
        self.fetch_profile(&access_token).await
    }
}

/// Check response status and parse the JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, IdentityError> {
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(IdentityError::Rejected { status, body });
    }

    response
        .json()
        .await
        .map_err(|e| IdentityError::Transport(format!("JSON parse error: {}", e)))
}
