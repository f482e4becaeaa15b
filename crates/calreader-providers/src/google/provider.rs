//! Google Calendar provider implementation.

use std::sync::Arc;

use calreader_core::{DisplayEvent, EventQuery};
use chrono::Duration;
use tracing::debug;

use crate::credential::{CredentialManager, TokenStore};
use crate::error::ProviderResult;
use crate::normalize::collect_events;
use crate::provider::{AuthState, BoxFuture, EventProvider, EventSource};

use super::client::{ApiEvent, GoogleCalendarClient};
use super::config::GoogleConfig;

/// Google Calendar provider.
///
/// Reads one calendar through the Calendar API v3 with recurring events
/// expanded server-side.
#[derive(Debug)]
pub struct GoogleProvider {
    config: GoogleConfig,
    credentials: CredentialManager,
}

impl GoogleProvider {
    /// Creates the provider; tokens are read from `store` lazily on first use.
    pub fn new(config: GoogleConfig, store: Arc<dyn TokenStore>) -> ProviderResult<Self> {
        config.credentials.validate()?;
        let credentials = CredentialManager::new(config.oauth_config(), store, config.timeout)?;
        Ok(Self {
            config,
            credentials,
        })
    }

    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    async fn fetch_impl(&self, query: EventQuery) -> ProviderResult<Vec<DisplayEvent>> {
        let auth = self.credentials.authorized_client().await?;
        let client = GoogleCalendarClient::new(auth, &self.config.api_base);

        debug!(calendar_id = %self.config.calendar_id, limit = query.limit, "fetching Google events");
        let items = client
            .list_events(&self.config.calendar_id, &query)
            .await
            .map_err(|e| e.with_provider(GoogleConfig::PROVIDER_NAME))?;

        Ok(collect_events(
            GoogleConfig::PROVIDER_NAME,
            items,
            query.limit,
            ApiEvent::into_display_event,
        ))
    }
}

impl EventSource for GoogleProvider {
    fn fetch_events(&self, query: EventQuery) -> BoxFuture<'_, ProviderResult<Vec<DisplayEvent>>> {
        Box::pin(self.fetch_impl(query))
    }
}

impl EventProvider for GoogleProvider {
    fn name(&self) -> &str {
        GoogleConfig::PROVIDER_NAME
    }

    fn redirect_url(&self, callback_host: &str) -> String {
        self.credentials.redirect_url(callback_host)
    }

    fn exchange_code<'a>(&'a self, code: &'a str, state: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(self.credentials.exchange_code(code, state))
    }

    fn auth_state(&self) -> BoxFuture<'_, AuthState> {
        Box::pin(self.credentials.auth_state())
    }

    fn refresh_auth(&self, window: Duration) -> BoxFuture<'_, ProviderResult<bool>> {
        Box::pin(self.credentials.refresh_if_expiring(window))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::{AppCredentials, MemoryTokenStore};
    use crate::error::ProviderErrorCode;

    fn provider() -> GoogleProvider {
        let config = GoogleConfig::new(AppCredentials::new(
            "test-client.apps.googleusercontent.com",
            "test-secret",
        ));
        GoogleProvider::new(config, Arc::new(MemoryTokenStore::new())).unwrap()
    }

    #[test]
    fn provider_name() {
        assert_eq!(provider().name(), "Google");
    }

    #[test]
    fn rejects_empty_client_id() {
        let config = GoogleConfig::new(AppCredentials::new("", "secret"));
        let err = GoogleProvider::new(config, Arc::new(MemoryTokenStore::new())).unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AppCredentialMissing);
    }

    #[test]
    fn redirect_url_targets_google() {
        let url = provider().redirect_url("localhost:8080");
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("state=Google%3A"));
        assert!(url.contains("prompt=consent"));
    }

    #[tokio::test]
    async fn unauthenticated_fetch_is_not_authorized() {
        let provider = provider();
        assert_eq!(provider.auth_state().await, AuthState::Unauthenticated);

        let err = provider.events_starting_today(5).await.unwrap_err();
        assert!(err.is_not_authorized());
        assert_eq!(err.provider(), Some("Google"));
    }
}
