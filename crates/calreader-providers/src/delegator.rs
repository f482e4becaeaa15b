//! Multi-provider fan-out with partial-failure tolerance.

use std::sync::Arc;
use std::time::Duration;

use calreader_core::{DisplayEvent, EventQuery};
use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::provider::{BoxFuture, EventProvider, EventSource};
use crate::registry::{ProviderRegistry, unknown_provider};

/// Queries every registered provider and merges the results.
///
/// A failing provider contributes nothing; the call itself only fails when
/// every provider is unauthorized and nothing was returned, which callers
/// treat as "setup needed".
#[derive(Debug, Clone)]
pub struct Delegator {
    registry: Arc<ProviderRegistry>,
    provider_timeout: Duration,
}

impl Delegator {
    pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(45);

    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            provider_timeout: Self::DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    /// Upper bound on a single provider's fetch, on top of its HTTP timeout.
    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Queries a single named provider.
    ///
    /// # Errors
    ///
    /// `ConfigurationError` for an unknown name, otherwise whatever the
    /// provider returns.
    pub async fn fetch_events_from(
        &self,
        name: &str,
        query: EventQuery,
    ) -> ProviderResult<Vec<DisplayEvent>> {
        let provider = self.registry.get(name).ok_or_else(|| unknown_provider(name))?;
        self.fetch_one(provider, query).await
    }

    async fn fetch_one(
        &self,
        provider: &Arc<dyn EventProvider>,
        query: EventQuery,
    ) -> ProviderResult<Vec<DisplayEvent>> {
        match tokio::time::timeout(self.provider_timeout, provider.fetch_events(query)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::fetch(format!(
                "no response within {:?}",
                self.provider_timeout
            ))
            .with_provider(provider.name())),
        }
    }

    async fn fetch_all(&self, query: EventQuery) -> ProviderResult<Vec<DisplayEvent>> {
        let results = join_all(
            self.registry
                .iter()
                .map(|provider| self.fetch_one(provider, query)),
        )
        .await;

        let mut events = Vec::new();
        let mut unauthorized = 0;

        for (provider, result) in self.registry.iter().zip(results) {
            match result {
                Ok(batch) => {
                    debug!(provider = %provider.name(), count = batch.len(), "provider returned events");
                    events.extend(batch);
                }
                Err(e) => {
                    if e.is_not_authorized() {
                        unauthorized += 1;
                    }
                    warn!(provider = %provider.name(), error = %e, "provider fetch failed");
                }
            }
        }

        if !self.registry.is_empty() && unauthorized == self.registry.len() && events.is_empty() {
            return Err(ProviderError::not_authorized(
                "no provider is authorized; complete setup first",
            ));
        }

        Ok(events)
    }
}

impl EventSource for Delegator {
    fn fetch_events(&self, query: EventQuery) -> BoxFuture<'_, ProviderResult<Vec<DisplayEvent>>> {
        Box::pin(self.fetch_all(query))
    }
}
