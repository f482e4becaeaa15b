//! OAuth 2.0 authorization-code flow with PKCE.
//!
//! The flow is split in two halves driven by the embedding application:
//!
//! 1. [`OAuthClient::authorization_url`] builds the consent URL for a fresh
//!    [`PkceFlow`]; the user visits it and the backend redirects back to the
//!    application's callback path with `code` and `state`.
//! 2. [`OAuthClient::exchange_code`] trades the code (plus the PKCE verifier)
//!    for a [`TokenInfo`].
//!
//! The `state` parameter is `"<provider>:<nonce>"`, so a single callback
//! endpoint can route the redirect to the provider that issued it.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng as _;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

use super::app::AppCredentials;
use super::tokens::TokenInfo;

/// The PKCE code verifier length (in bytes, before base64 encoding).
const CODE_VERIFIER_LENGTH: usize = 32;

/// Random bytes in the state nonce.
const STATE_NONCE_LENGTH: usize = 16;

/// Default path the backend redirects to after consent.
pub const DEFAULT_CALLBACK_PATH: &str = "/setup";

/// Endpoints and parameters of one backend's OAuth server.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    /// Provider name, embedded in the state token.
    pub provider: String,
    pub credentials: AppCredentials,
    pub auth_url: String,
    pub token_url: String,
    pub scopes: Vec<String>,
    /// Extra query parameters for the consent URL (e.g. `access_type=offline`).
    pub extra_auth_params: Vec<(String, String)>,
    /// Whether token requests repeat the `scope` parameter (Microsoft identity platform).
    pub scope_in_token_request: bool,
    /// Path component of the redirect URI.
    pub callback_path: String,
}

impl OAuthConfig {
    pub fn new(
        provider: impl Into<String>,
        credentials: AppCredentials,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        Self {
            provider: provider.into(),
            credentials,
            auth_url: auth_url.into(),
            token_url: token_url.into(),
            scopes: Vec::new(),
            extra_auth_params: Vec::new(),
            scope_in_token_request: false,
            callback_path: DEFAULT_CALLBACK_PATH.to_string(),
        }
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_auth_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_auth_params.push((key.into(), value.into()));
        self
    }

    pub fn with_scope_in_token_request(mut self, enabled: bool) -> Self {
        self.scope_in_token_request = enabled;
        self
    }

    /// Sets the callback path; a missing leading slash is added.
    pub fn with_callback_path(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.callback_path = if path.starts_with('/') {
            path
        } else {
            format!("/{}", path)
        };
        self
    }

    /// The redirect URI registered with the backend for `callback_host`.
    pub fn redirect_uri(&self, callback_host: &str) -> String {
        format!("http://{}{}", callback_host, self.callback_path)
    }
}

/// PKCE flow state and utilities (RFC 7636).
#[derive(Debug, Clone)]
pub struct PkceFlow {
    /// The code verifier (high-entropy random string).
    pub verifier: String,
    /// The code challenge (SHA-256 hash of verifier, base64url encoded).
    pub challenge: String,
    /// `"<provider>:<nonce>"`.
    pub state: String,
}

impl PkceFlow {
    /// Creates a new flow for `provider` with random verifier and nonce.
    pub fn new(provider: &str) -> Self {
        let verifier = random_token(CODE_VERIFIER_LENGTH);
        let challenge = Self::compute_challenge(&verifier);
        let state = format!("{}:{}", provider, random_token(STATE_NONCE_LENGTH));

        Self {
            verifier,
            challenge,
            state,
        }
    }

    /// Computes the SHA-256 challenge for a code verifier.
    fn compute_challenge(verifier: &str) -> String {
        let digest = Sha256::digest(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(digest)
    }
}

fn random_token(len: usize) -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
    URL_SAFE_NO_PAD.encode(&bytes)
}

/// Extracts the provider name from a state token.
///
/// Returns `None` for tokens without a provider prefix.
pub fn provider_from_state(state: &str) -> Option<&str> {
    match state.rsplit_once(':') {
        Some((provider, nonce)) if !provider.is_empty() && !nonce.is_empty() => Some(provider),
        _ => None,
    }
}

/// Talks to one backend's authorization and token endpoints.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    config: OAuthConfig,
    http_client: reqwest::Client,
}

impl OAuthClient {
    pub fn new(config: OAuthConfig, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Builds the consent URL for `flow`.
    pub fn authorization_url(&self, flow: &PkceFlow, redirect_uri: &str) -> String {
        let scope = self.config.scopes.join(" ");

        let mut url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&\
            code_challenge={}&code_challenge_method=S256&state={}",
            self.config.auth_url,
            urlencoding::encode(&self.config.credentials.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scope),
            urlencoding::encode(&flow.challenge),
            urlencoding::encode(&flow.state),
        );

        for (key, value) in &self.config.extra_auth_params {
            url.push('&');
            url.push_str(&urlencoding::encode(key));
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }

        url
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// `TokenExchangeFailed` on any failure.
    pub async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
    ) -> ProviderResult<TokenInfo> {
        let mut params = vec![
            ("client_id", self.config.credentials.client_id.clone()),
            ("code", code.to_string()),
            ("code_verifier", verifier.to_string()),
            ("grant_type", "authorization_code".to_string()),
            ("redirect_uri", redirect_uri.to_string()),
        ];
        self.push_common_params(&mut params);

        let (status, body) = self
            .post_token_request(&params)
            .await
            .map_err(|e| ProviderError::token_exchange("token exchange request failed").with_source(e))?;

        if !status.is_success() {
            return Err(ProviderError::token_exchange(format!(
                "token exchange failed ({}): {}",
                status, body
            )));
        }

        let response: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::token_exchange("invalid token response").with_source(e)
        })?;

        info!(provider = %self.config.provider, "obtained tokens from authorization code");
        Ok(response.into_token_info())
    }

    /// Obtains a new access token from a refresh token.
    ///
    /// # Errors
    ///
    /// `NotAuthorized` when the server rejects the refresh token (the user
    /// must authorize again), `FetchFailed` when it could not be reached.
    pub async fn refresh(&self, refresh_token: &str) -> ProviderResult<TokenInfo> {
        let mut params = vec![
            ("client_id", self.config.credentials.client_id.clone()),
            ("refresh_token", refresh_token.to_string()),
            ("grant_type", "refresh_token".to_string()),
        ];
        self.push_common_params(&mut params);

        let (status, body) = self
            .post_token_request(&params)
            .await
            .map_err(|e| ProviderError::fetch("token refresh request failed").with_source(e))?;

        if status.is_server_error() {
            return Err(ProviderError::fetch(format!(
                "token endpoint unavailable ({})",
                status
            )));
        }
        if !status.is_success() {
            return Err(ProviderError::not_authorized(format!(
                "token refresh rejected ({}): {}",
                status, body
            )));
        }

        let response: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::fetch("invalid token refresh response").with_source(e))?;

        debug!(provider = %self.config.provider, "refreshed access token");
        Ok(response.into_token_info())
    }

    fn push_common_params(&self, params: &mut Vec<(&'static str, String)>) {
        if !self.config.credentials.client_secret.is_empty() {
            params.push(("client_secret", self.config.credentials.client_secret.clone()));
        }
        if self.config.scope_in_token_request && !self.config.scopes.is_empty() {
            params.push(("scope", self.config.scopes.join(" ")));
        }
    }

    async fn post_token_request(
        &self,
        params: &[(&'static str, String)],
    ) -> Result<(reqwest::StatusCode, String), reqwest::Error> {
        let response = self
            .http_client
            .post(&self.config.token_url)
            .form(params)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        Ok((status, body))
    }
}

/// Response from a token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    token_type: Option<String>,
}

impl TokenResponse {
    fn into_token_info(self) -> TokenInfo {
        let mut token = TokenInfo::new(self.access_token, self.refresh_token, self.expires_in);
        if let Some(token_type) = self.token_type {
            token.token_type = token_type;
        }
        token
    }
}
