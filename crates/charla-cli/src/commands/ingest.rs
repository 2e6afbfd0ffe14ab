//! Attachment extraction command

use crate::console::CliConsole;
use charla_core::{AttachmentKind, CharlaError, CharlaResult, Config, ExtractorRegistry};
use colored::Colorize;
use std::path::Path;

/// Extract one file and print the text a chat turn would carry
pub async fn run(config: &Config, file: &Path, verbose: bool) -> CharlaResult<()> {
    let console = CliConsole::new(verbose);
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CharlaError::invalid_input(format!("Not a file: {}", file.display())))?;

    let bytes = tokio::fs::read(file).await?;
    console.info(&format!("Read {} byte(s) from {}", bytes.len(), file.display()));

    let registry = ExtractorRegistry::with_defaults(config.max_attachment_chars);
    let extraction = registry.ingest(file_name, bytes).await;

    if let Some(warning) = extraction.warning {
        return Err(CharlaError::invalid_input(format!(
            "No text extracted from {}: {}",
            file_name, warning
        )));
    }

    let kind = extraction
        .kind
        .map(|k| k.label())
        .unwrap_or(AttachmentKind::PlainText.label());
    println!(
        "{}",
        format!("--- {} ({}, {}) ---", extraction.file_name, extraction.extension, kind).dimmed()
    );
    println!("{}", extraction.text);
    if extraction.truncated {
        console.warn(&format!("Text cut at {} characters", registry.max_chars()));
    }
    Ok(())
}
