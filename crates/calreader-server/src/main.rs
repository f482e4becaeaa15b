//! calreader CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

use calreader_core::{TracingConfig, init_tracing};
use calreader_server::cli::{Cli, Command};
use calreader_server::commands;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let tracing = match (&cli.command, cli.debug) {
        (Command::Daemon, true) => TracingConfig::daemon().with_level(Level::DEBUG),
        (Command::Daemon, false) => TracingConfig::daemon(),
        (_, true) => TracingConfig::cli_debug(),
        (_, false) => TracingConfig::cli(),
    };
    if let Err(e) = init_tracing(tracing) {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    match commands::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            if e.needs_setup() {
                eprintln!("hint: run `calreader authorize <provider>` first");
            }
            ExitCode::FAILURE
        }
    }
}
