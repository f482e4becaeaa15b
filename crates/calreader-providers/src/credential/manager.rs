//! Per-provider credential lifecycle: authorize, exchange, persist, refresh.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::AuthState;

use super::oauth::{OAuthClient, OAuthConfig, PkceFlow};
use super::tokens::{TokenInfo, TokenStore};

/// An authorization flow waiting for its callback.
#[derive(Debug, Clone)]
struct PendingAuthorization {
    state: String,
    verifier: String,
    redirect_uri: String,
}

/// An HTTP client paired with a currently valid bearer token.
#[derive(Debug, Clone)]
pub struct AuthorizedClient {
    http: reqwest::Client,
    access_token: String,
}

impl AuthorizedClient {
    pub fn new(http: reqwest::Client, access_token: impl Into<String>) -> Self {
        Self {
            http,
            access_token: access_token.into(),
        }
    }

    /// Starts an authenticated GET request.
    pub fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.http.get(url).bearer_auth(&self.access_token)
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

/// Owns one provider's OAuth credential.
///
/// The cached token lives behind an async mutex, so concurrent fetches that
/// find an expiring token wait for a single refresh instead of racing.
pub struct CredentialManager {
    provider: String,
    oauth: OAuthClient,
    store: Arc<dyn TokenStore>,
    http: reqwest::Client,
    token: tokio::sync::Mutex<Option<TokenInfo>>,
    pending: Mutex<Option<PendingAuthorization>>,
}

impl CredentialManager {
    /// Creates a manager whose HTTP client times out after `request_timeout`.
    pub fn new(
        config: OAuthConfig,
        store: Arc<dyn TokenStore>,
        request_timeout: Duration,
    ) -> ProviderResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("calreader/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::internal("failed to create HTTP client").with_source(e))?;
        Ok(Self::with_http_client(config, store, http))
    }

    pub fn with_http_client(
        config: OAuthConfig,
        store: Arc<dyn TokenStore>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            provider: config.provider.clone(),
            oauth: OAuthClient::new(config, http.clone()),
            store,
            http,
            token: tokio::sync::Mutex::new(None),
            pending: Mutex::new(None),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Starts a new authorization flow, replacing any pending one.
    pub fn redirect_url(&self, callback_host: &str) -> String {
        let flow = PkceFlow::new(&self.provider);
        let redirect_uri = self.oauth.config().redirect_uri(callback_host);
        let url = self.oauth.authorization_url(&flow, &redirect_uri);

        let replaced = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(PendingAuthorization {
                state: flow.state,
                verifier: flow.verifier,
                redirect_uri,
            })
            .is_some();

        if replaced {
            debug!(provider = %self.provider, "replaced pending authorization");
        }
        info!(provider = %self.provider, "issued authorization URL");
        url
    }

    /// Exchanges an authorization code for a user token.
    ///
    /// On success the token is persisted, then cached, then the pending flow
    /// is cleared. On failure nothing changes and `false` is returned.
    pub async fn exchange_code(&self, code: &str, state: &str) -> bool {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let Some(pending) = pending else {
            warn!(provider = %self.provider, "authorization callback without a pending flow");
            return false;
        };
        if pending.state != state {
            warn!(provider = %self.provider, "authorization callback state mismatch");
            return false;
        }

        let token = match self
            .oauth
            .exchange_code(code, &pending.verifier, &pending.redirect_uri)
            .await
        {
            Ok(token) => token,
            Err(e) => {
                warn!(provider = %self.provider, error = %e, "token exchange failed");
                return false;
            }
        };

        let mut slot = self.token.lock().await;
        if let Err(e) = self.store.put(&self.provider, &token) {
            warn!(provider = %self.provider, error = %e, "failed to persist exchanged token");
            return false;
        }
        *slot = Some(token);
        drop(slot);

        let mut pending_slot = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending_slot.as_ref().is_some_and(|p| p.state == pending.state) {
            *pending_slot = None;
        }

        info!(provider = %self.provider, "authorization completed");
        true
    }

    /// Returns a client carrying a valid access token.
    ///
    /// Loads the token from the store on first use and refreshes it when it
    /// expires within 60 seconds.
    ///
    /// # Errors
    ///
    /// `NotAuthorized` without a usable token (or when the refresh token was
    /// rejected, or the stored token cannot be read), `FetchFailed` when the
    /// token endpoint is unreachable.
    pub async fn authorized_client(&self) -> ProviderResult<AuthorizedClient> {
        let mut slot = self.token.lock().await;
        self.load_if_empty(&mut slot)
            .map_err(|e| e.with_provider(&self.provider))?;

        let Some(token) = slot.as_mut() else {
            return Err(ProviderError::not_authorized("no token; authorization required")
                .with_provider(&self.provider));
        };

        if token.is_expired() {
            if !token.can_refresh() {
                return Err(ProviderError::not_authorized(
                    "token expired and no refresh token is available",
                )
                .with_provider(&self.provider));
            }
            self.refresh_locked(token).await?;
        }

        Ok(AuthorizedClient::new(self.http.clone(), token.access_token.clone()))
    }

    /// Refreshes the token if it expires within `window`.
    ///
    /// Returns `Ok(false)` when there is nothing to refresh.
    pub async fn refresh_if_expiring(&self, window: chrono::Duration) -> ProviderResult<bool> {
        let mut slot = self.token.lock().await;
        self.load_if_empty(&mut slot)
            .map_err(|e| e.with_provider(&self.provider))?;

        match slot.as_mut() {
            Some(token) if token.can_refresh() && token.expires_within(window) => {
                self.refresh_locked(token).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Current authorization state; an existing token takes precedence over a pending flow.
    pub async fn auth_state(&self) -> AuthState {
        let mut slot = self.token.lock().await;
        // unreadable tokens are logged by the loader and count as none
        let _ = self.load_if_empty(&mut slot);

        if slot
            .as_ref()
            .is_some_and(|t| !t.is_expired() || t.can_refresh())
        {
            return AuthState::Authorized;
        }

        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some();
        if pending {
            AuthState::AuthorizationPending
        } else {
            AuthState::Unauthenticated
        }
    }

    /// Fills an empty slot from the store.
    ///
    /// An unreadable stored token counts as no token: the slot stays empty
    /// until the next successful exchange overwrites the file.
    fn load_if_empty(&self, slot: &mut Option<TokenInfo>) -> ProviderResult<()> {
        if slot.is_some() {
            return Ok(());
        }
        match self.store.get(&self.provider) {
            Ok(token) => {
                *slot = token;
                Ok(())
            }
            Err(e) => {
                warn!(provider = %self.provider, error = %e, "stored token is unreadable");
                Err(ProviderError::not_authorized(
                    "stored token is unreadable; authorization required",
                )
                .with_source(e))
            }
        }
    }

    /// Refreshes `token` in place; the caller holds the token lock.
    async fn refresh_locked(&self, token: &mut TokenInfo) -> ProviderResult<()> {
        let refresh_token = token.refresh_token.clone().ok_or_else(|| {
            ProviderError::not_authorized("no refresh token").with_provider(&self.provider)
        })?;

        let refreshed = self
            .oauth
            .refresh(&refresh_token)
            .await
            .map_err(|e| e.with_provider(&self.provider))?;
        token.apply_refresh(refreshed);

        if let Err(e) = self.store.put(&self.provider, token) {
            warn!(provider = %self.provider, error = %e, "failed to persist refreshed token");
        }
        info!(provider = %self.provider, "refreshed access token");
        Ok(())
    }
}

impl std::fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialManager")
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}
