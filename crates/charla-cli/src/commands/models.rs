//! Model listing command

use charla_core::models::find_model;
use charla_core::{Config, MODELS};
use colored::Colorize;

/// Print the model table, marking the configured default
pub fn list(config: &Config) {
    println!("\n{}", "Available models".bold().underline());
    println!();

    let width = MODELS.iter().map(|m| m.id.len()).max().unwrap_or(0);
    for model in MODELS {
        let marker = if model.id == config.default_model {
            "*".green().bold()
        } else {
            " ".normal()
        };
        println!(
            "{} {:<width$}  {}",
            marker,
            model.id.bright_white(),
            model.description.dimmed(),
            width = width
        );
    }

    if find_model(&config.default_model).is_none() {
        println!();
        println!(
            "{}",
            format!(
                "Configured model '{}' is not in the built-in list.",
                config.default_model
            )
            .yellow()
        );
    }
}
