//! calreader service: configuration, provider bootstrap, background
//! maintenance and the `calreader` command line.
//!
//! - [`config`]: `config.toml` loading
//! - [`bootstrap`]: builds the provider registry and delegator from config
//! - [`interval`]: periodic background tasks
//! - [`commands`]: the CLI subcommands

pub mod bootstrap;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod interval;

pub use bootstrap::{build_delegator, build_registry, build_registry_with_store, refresh_sweep};
pub use config::ServiceConfig;
pub use error::{ServerError, ServerResult};
pub use interval::{IntervalHandle, run_at_interval};
