//! `calreader daemon`: token maintenance in the foreground until Ctrl-C.

use std::sync::Arc;

use calreader_providers::{Delegator, EventSource};
use tracing::{debug, info, warn};

use crate::bootstrap::{build_delegator, build_registry, refresh_sweep};
use crate::config::ServiceConfig;
use crate::error::{ServerError, ServerResult};
use crate::interval::run_at_interval;

pub async fn run(config: &ServiceConfig) -> ServerResult<()> {
    let registry = Arc::new(build_registry(config)?);
    if registry.is_empty() {
        return Err(ServerError::config("no calendar provider is enabled"));
    }

    let window = config.refresh_window();
    refresh_sweep(&registry, window).await;

    let sweep_registry = registry.clone();
    let sweep = run_at_interval("token-refresh", config.refresh_interval(), move || {
        let registry = sweep_registry.clone();
        async move {
            refresh_sweep(&registry, window).await;
        }
    });

    let delegator = build_delegator(config, registry.clone());
    let limit = config.default_limit;
    log_todays_events(&delegator, limit).await;
    let report = run_at_interval("todays-events", config.refresh_interval(), move || {
        let delegator = delegator.clone();
        async move { log_todays_events(&delegator, limit).await }
    });

    info!(providers = ?registry.names(), "daemon running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    sweep.cancel();
    report.cancel();
    sweep.stopped().await;
    report.stopped().await;
    Ok(())
}

async fn log_todays_events(delegator: &Delegator, limit: i64) {
    match delegator.events_starting_today(limit).await {
        Ok(events) => {
            info!(count = events.len(), "fetched today's events");
            for event in &events {
                debug!(
                    day = %event.day(),
                    start = event.start_time().unwrap_or("all day"),
                    "{}",
                    event.description()
                );
            }
        }
        Err(e) if e.is_not_authorized() => {
            warn!("no provider is authorized; run `calreader authorize <provider>`");
        }
        Err(e) => warn!(error = %e, "failed to fetch today's events"),
    }
}
