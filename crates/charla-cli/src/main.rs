//! Charla CLI application
//!
//! Command-line access to saved chat transcripts: list, read, rename,
//! export and import them, preview the default name of a chat, and check
//! what text an attachment contributes to a turn.
//!
//! # Installation
//!
//! ```bash
//! cargo install --path crates/charla-cli
//! ```

mod args;
mod commands;
mod console;
mod router;

use charla_core::{CharlaError, Config};
use clap::Parser;
use args::{Cli, Commands, ConfigAction};
use console::CliConsole;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let console = CliConsole::new(cli.verbose);

    // `config init` must work even when the current file is broken
    let config = match &cli.command {
        Commands::Config {
            action: ConfigAction::Init { .. },
        } => Config::default(),
        _ => match Config::load(&cli.config_file) {
            Ok(config) => config,
            Err(e) => return Ok(report(&console, &e)),
        },
    };

    // RUST_LOG wins over --verbose, which wins over the config file
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if cli.verbose {
            "debug"
        } else {
            config.logging.level.as_str()
        };
        EnvFilter::new(level)
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match router::route(cli, config).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => Ok(report(&console, &e)),
    }
}

fn report(console: &CliConsole, error: &CharlaError) -> ExitCode {
    console.error(&error.user_message());
    ExitCode::FAILURE
}
