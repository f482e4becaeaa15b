//! Turns a [`ServiceConfig`] into registered providers.

use std::sync::Arc;

use calreader_providers::credential::{FileTokenStore, TokenStore};
use calreader_providers::google::GoogleProvider;
use calreader_providers::outlook::OutlookProvider;
use calreader_providers::{Delegator, EventProvider, ProviderRegistry};
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::error::ServerResult;

/// Registers every enabled provider, with tokens kept under the configured token dir.
///
/// # Errors
///
/// Fails when an enabled provider has no usable app credentials; the service
/// must not start half-configured.
pub fn build_registry(config: &ServiceConfig) -> ServerResult<ProviderRegistry> {
    let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(config.token_dir()));
    build_registry_with_store(config, store)
}

/// Same as [`build_registry`] with an explicit token store.
pub fn build_registry_with_store(
    config: &ServiceConfig,
    store: Arc<dyn TokenStore>,
) -> ServerResult<ProviderRegistry> {
    let mut registry = ProviderRegistry::new();

    if let Some(google) = config.google.as_ref().filter(|g| g.enabled) {
        let provider = GoogleProvider::new(google.to_provider_config(config)?, store.clone())?;
        register(&mut registry, Arc::new(provider))?;
    }

    if let Some(outlook) = config.outlook.as_ref().filter(|o| o.enabled) {
        let provider = OutlookProvider::new(outlook.to_provider_config(config)?, store)?;
        register(&mut registry, Arc::new(provider))?;
    }

    if registry.is_empty() {
        warn!("no calendar provider is enabled");
    }
    Ok(registry)
}

fn register(registry: &mut ProviderRegistry, provider: Arc<dyn EventProvider>) -> ServerResult<()> {
    let name = provider.name().to_string();
    registry.register(provider)?;
    info!(provider = %name, "provider registered");
    Ok(())
}

pub fn build_delegator(config: &ServiceConfig, registry: Arc<ProviderRegistry>) -> Delegator {
    Delegator::new(registry).with_provider_timeout(config.provider_timeout())
}

/// Refreshes every token that expires within `window`.
///
/// Failures are logged and do not stop the sweep. Returns how many tokens
/// were refreshed.
pub async fn refresh_sweep(registry: &ProviderRegistry, window: chrono::Duration) -> usize {
    let mut refreshed = 0;
    for provider in registry.iter() {
        match provider.refresh_auth(window).await {
            Ok(true) => {
                info!(provider = %provider.name(), "token refreshed");
                refreshed += 1;
            }
            Ok(false) => debug!(provider = %provider.name(), "no refresh needed"),
            Err(e) if e.is_not_authorized() => {
                warn!(provider = %provider.name(), error = %e, "token refresh rejected, authorize again");
            }
            Err(e) => warn!(provider = %provider.name(), error = %e, "token refresh failed"),
        }
    }
    refreshed
}
