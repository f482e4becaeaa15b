//! Outlook provider implementation.

use std::sync::Arc;

use calreader_core::{DisplayEvent, EventQuery};
use chrono::Duration;
use tracing::debug;

use crate::credential::{CredentialManager, TokenStore};
use crate::error::ProviderResult;
use crate::normalize::collect_events;
use crate::provider::{AuthState, BoxFuture, EventProvider, EventSource};

use super::client::{GraphCalendarClient, GraphEvent};
use super::config::OutlookConfig;

/// Outlook / Microsoft 365 calendar provider backed by Microsoft Graph.
#[derive(Debug)]
pub struct OutlookProvider {
    config: OutlookConfig,
    credentials: CredentialManager,
}

impl OutlookProvider {
    pub fn new(config: OutlookConfig, store: Arc<dyn TokenStore>) -> ProviderResult<Self> {
        config.validate()?;
        let credentials = CredentialManager::new(config.oauth_config(), store, config.timeout)?;
        Ok(Self {
            config,
            credentials,
        })
    }

    pub fn config(&self) -> &OutlookConfig {
        &self.config
    }

    async fn fetch_impl(&self, query: EventQuery) -> ProviderResult<Vec<DisplayEvent>> {
        let auth = self.credentials.authorized_client().await?;
        let client =
            GraphCalendarClient::new(auth, &self.config.api_base, &self.config.time_zone);

        debug!(
            limit = query.limit,
            horizon_days = self.config.horizon_days,
            "fetching Outlook events"
        );
        let items = client
            .calendar_view(&query, Duration::days(i64::from(self.config.horizon_days)))
            .await
            .map_err(|e| e.with_provider(OutlookConfig::PROVIDER_NAME))?;

        Ok(collect_events(
            OutlookConfig::PROVIDER_NAME,
            items,
            query.limit,
            GraphEvent::into_display_event,
        ))
    }
}

impl EventSource for OutlookProvider {
    fn fetch_events(&self, query: EventQuery) -> BoxFuture<'_, ProviderResult<Vec<DisplayEvent>>> {
        Box::pin(self.fetch_impl(query))
    }
}

impl EventProvider for OutlookProvider {
    fn name(&self) -> &str {
        OutlookConfig::PROVIDER_NAME
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
    use crate::credential::{AppCredentials, MemoryTokenStore, TokenInfo};
    use crate::error::ProviderErrorCode;

    #[test]
    fn rejects_unknown_time_zone() {
        let config =
            OutlookConfig::new(AppCredentials::new("app-id", "")).with_time_zone("Nowhere/City");
        let err = OutlookProvider::new(config, Arc::new(MemoryTokenStore::new())).unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ConfigurationError);
    }

    #[test]
    fn redirect_url_targets_microsoft_login() {
        let provider = OutlookProvider::new(
            OutlookConfig::new(AppCredentials::new("app-id", "")),
            Arc::new(MemoryTokenStore::new()),
        )
        .unwrap();

        let url = provider.redirect_url("kindle.local:8080");
        assert!(url.starts_with("https://login.microsoftonline.com/common/oauth2/v2.0/authorize?"));
        assert!(url.contains("state=Outlook%3A"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Fkindle.local%3A8080%2Fsetup"));
    }

    #[tokio::test]
    async fn stored_token_makes_provider_authorized() {
        let store = MemoryTokenStore::new()
            .with_token("Outlook", TokenInfo::new("at", Some("rt".to_string()), Some(3600)));
        let provider = OutlookProvider::new(
            OutlookConfig::new(AppCredentials::new("app-id", "")),
            Arc::new(store),
        )
        .unwrap();

        assert_eq!(provider.name(), "Outlook");
        assert_eq!(provider.auth_state().await, AuthState::Authorized);
    }
}
