//! Subcommand implementations.

pub mod authorize;
pub mod daemon;
pub mod events;
pub mod status;

use calreader_providers::ProviderRegistry;

use crate::cli::{Cli, Command};
use crate::config::ServiceConfig;
use crate::error::ServerResult;

/// Loads the configuration and runs the selected command.
pub async fn run(cli: Cli) -> ServerResult<()> {
    let config = ServiceConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Events {
            provider,
            start,
            limit,
            grouped,
        } => events::run(&config, provider.as_deref(), start.as_deref(), limit, grouped).await,
        Command::Authorize {
            provider,
            host,
            no_browser,
        } => authorize::run(&config, &provider, &host, !no_browser).await,
        Command::Status => status::run(&config).await,
        Command::Daemon => daemon::run(&config).await,
    }
}

/// Matches a user-typed provider name against the registered ones, ignoring case.
///
/// Unknown names are returned as typed so the registry reports them.
pub(crate) fn resolve_provider_name(registry: &ProviderRegistry, name: &str) -> String {
    registry
        .names()
        .into_iter()
        .find(|n| n.eq_ignore_ascii_case(name))
        .unwrap_or(name)
        .to_string()
}
