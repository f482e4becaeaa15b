//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::CONFIG_ENV;

/// calreader - read-only calendar events from Google and Outlook
#[derive(Debug, Parser)]
#[command(name = "calreader")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = CONFIG_ENV, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print upcoming events as JSON
    Events {
        /// Only query this provider (default: all)
        #[arg(long, short)]
        provider: Option<String>,

        /// Start of the window, RFC 3339 (default: local midnight today)
        #[arg(long, short)]
        start: Option<String>,

        /// Maximum events per provider; zero or less uses the configured default
        #[arg(long, short, allow_negative_numbers = true)]
        limit: Option<i64>,

        /// Group events by day
        #[arg(long, short)]
        grouped: bool,
    },

    /// Authorize access to a provider's calendar
    Authorize {
        /// Provider name, e.g. Google or Outlook
        provider: String,

        /// Host the consent page redirects back to
        #[arg(long, default_value = "localhost:8080")]
        host: String,

        /// Print the URL without opening a browser
        #[arg(long)]
        no_browser: bool,
    },

    /// Show each provider's authorization state
    Status,

    /// Keep tokens fresh in the foreground, logging today's events
    Daemon,
}
