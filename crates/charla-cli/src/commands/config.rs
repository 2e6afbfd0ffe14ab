//! Configuration management commands

use crate::console::CliConsole;
use charla_core::{CharlaError, CharlaResult, Config};
use colored::*;
use std::path::Path;

/// Show the effective configuration
pub async fn show(config_file: &Path, chats_dir_override: Option<&Path>) -> CharlaResult<()> {
    let console = CliConsole::new(true);

    console.print_header("Configuration");

    if config_file.exists() {
        console.success(&format!(
            "Loaded configuration from: {}",
            config_file.display()
        ));
    } else {
        console.warn(&format!(
            "Configuration file not found: {}",
            config_file.display()
        ));
        console.info("Using default configuration");
    }

    let mut config = Config::load(config_file)?;
    if let Some(dir) = chats_dir_override {
        config.chats_dir = Some(dir.to_path_buf());
    }
    print_config(&console, &config)
}

/// Initialize a new configuration file
pub async fn init(config_file: &Path, force: bool) -> CharlaResult<()> {
    let console = CliConsole::new(true);

    console.print_header("Configuration Initialization");

    if config_file.exists() && !force {
        console.info("Use --force to overwrite");
        return Err(CharlaError::config(format!(
            "Configuration file already exists: {}",
            config_file.display()
        )));
    }

    Config::default().save_to_file(config_file)?;

    console.success(&format!(
        "Created configuration file: {}",
        config_file.display()
    ));
    Ok(())
}

fn print_config(console: &CliConsole, config: &Config) -> CharlaResult<()> {
    console.info(&format!(
        "Chats directory: {}",
        config.chats_dir()?.display().to_string().cyan()
    ));
    console.info(&format!("Default model: {}", config.default_model.green()));
    console.info(&format!("Greeting: {}", config.greeting));
    console.info(&format!(
        "Auto-save: {}",
        if config.auto_save {
            "✓ Enabled".green()
        } else {
            "✗ Disabled".red()
        }
    ));
    console.info(&format!(
        "Attachment limit: {} chars",
        config.max_attachment_chars.to_string().yellow()
    ));
    console.info(&format!("Log level: {}", config.logging.level));
    Ok(())
}
