//! Name-keyed provider registry and authorization-callback routing.

use std::sync::Arc;

use tracing::{info, warn};

use crate::credential::provider_from_state;
use crate::error::{ProviderError, ProviderResult};
use crate::provider::{AuthState, EventProvider};

/// Registered providers, in registration order.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn EventProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a provider.
    ///
    /// # Errors
    ///
    /// `ConfigurationError` when a provider with the same name is already registered.
    pub fn register(&mut self, provider: Arc<dyn EventProvider>) -> ProviderResult<()> {
        if self.get(provider.name()).is_some() {
            return Err(ProviderError::configuration(format!(
                "provider {} is already registered",
                provider.name()
            )));
        }
        info!(provider = %provider.name(), "registered provider");
        self.providers.push(provider);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn EventProvider>> {
        self.providers.iter().find(|p| p.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn EventProvider>> {
        self.providers.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Starts an authorization flow for the named provider.
    pub fn redirect_url(&self, name: &str, callback_host: &str) -> ProviderResult<String> {
        let provider = self.get(name).ok_or_else(|| unknown_provider(name))?;
        Ok(provider.redirect_url(callback_host))
    }

    /// Routes an authorization callback to the provider named in `state`.
    ///
    /// Returns `false` when the state does not name a registered provider or
    /// the exchange fails.
    pub async fn handle_authorization_callback(&self, state: &str, code: &str) -> bool {
        let Some(name) = provider_from_state(state) else {
            warn!("authorization callback with malformed state");
            return false;
        };
        let Some(provider) = self.get(name) else {
            warn!(provider = %name, "authorization callback for unknown provider");
            return false;
        };
        provider.exchange_code(code, state).await
    }

    /// Authorization state of every provider, in registration order.
    pub async fn auth_states(&self) -> Vec<(String, AuthState)> {
        let mut states = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            states.push((provider.name().to_string(), provider.auth_state().await));
        }
        states
    }
}

pub(crate) fn unknown_provider(name: &str) -> ProviderError {
    ProviderError::configuration(format!("unknown provider {}", name))
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}
