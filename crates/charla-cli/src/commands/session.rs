//! Chat record CLI commands
//!
//! Commands for listing, showing, deleting, renaming, exporting and
//! importing saved chats.

use crate::console::CliConsole;
use charla_core::CharlaResult;
use charla_session::{
    LocalSessionStore, Role, SessionStore, Transcript, export_file_name, export_transcript,
    import_name, import_transcript, naming,
};
use chrono::{DateTime, Utc};
use colored::Colorize;
use dialoguer::{Confirm, theme::ColorfulTheme};
use std::collections::HashSet;
use std::path::Path;

/// List saved chats
pub async fn list(store: &LocalSessionStore, limit: Option<usize>) -> CharlaResult<()> {
    let mut names = store.list().await?;
    let total = names.len();
    if let Some(limit) = limit {
        names.truncate(limit);
    }

    if names.is_empty() {
        println!("{}", "No saved chats.".yellow());
        println!(
            "{}",
            format!("Chats are stored in {}", store.base_path().display()).dimmed()
        );
        return Ok(());
    }

    println!("\n{}", "Saved chats".bold().underline());
    println!(
        "{}",
        format!("Showing {} of {} chat(s)", names.len(), total).dimmed()
    );
    println!();

    for name in &names {
        let modified = std::fs::metadata(store.record_path(name))
            .and_then(|m| m.modified())
            .map(|t| format_relative_time(DateTime::<Utc>::from(t)))
            .unwrap_or_else(|_| "unknown".to_string());

        println!("  {}  {}", name.bright_white(), modified.dimmed());
    }

    println!();
    println!(
        "{}",
        "Use 'charla show <name>' to read a chat.".dimmed()
    );
    Ok(())
}

/// Print a saved chat
pub async fn show(store: &LocalSessionStore, name: &str) -> CharlaResult<()> {
    let transcript = store.load(name).await?;

    println!("\n{}", name.bold().underline());
    println!(
        "{}",
        format!("{} message(s)", transcript.len()).dimmed()
    );
    print_transcript(&transcript);
    Ok(())
}

fn print_transcript(transcript: &Transcript) {
    for message in transcript {
        let role = match message.role {
            Role::User => "User".green().bold(),
            Role::Assistant => "Assistant".cyan().bold(),
        };
        let time = message
            .timestamp
            .local()
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_default();

        println!();
        let mut caption = time;
        if let Some(model) = &message.model_id {
            caption = format!("{} • {}", caption, model);
        }
        println!("{} {}", role, caption.dimmed());
        println!("{}", message.content);

        if let Some(files) = message.attachments.as_ref().filter(|f| !f.is_empty()) {
            println!(
                "{}",
                format!("Attached files: {}", files.join(", ")).dimmed()
            );
        }
    }
}

/// Delete a saved chat
pub async fn delete(store: &LocalSessionStore, name: &str, force: bool) -> CharlaResult<()> {
    let console = CliConsole::new(true);

    if !store.exists(name).await? {
        console.warn(&format!("Chat '{}' not found.", name));
        return Ok(());
    }

    if !force {
        let confirm = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Are you sure you want to delete chat '{}'?", name))
            .default(false)
            .interact()
            .unwrap_or(false);

        if !confirm {
            println!("{}", "Deletion cancelled.".dimmed());
            return Ok(());
        }
    }

    if store.delete(name).await? {
        console.success(&format!("Chat '{}' deleted.", name));
    } else {
        console.warn(&format!("Chat '{}' was already gone.", name));
    }
    Ok(())
}

/// Rename a saved chat
pub async fn rename(store: &LocalSessionStore, from: &str, to: &str) -> CharlaResult<()> {
    let renamed = store.rename(from, to).await?;
    CliConsole::new(true).success(&format!("Chat '{}' renamed to '{}'.", from, renamed));
    Ok(())
}

/// Export a saved chat to a file or stdout
pub async fn export(
    store: &LocalSessionStore,
    name: &str,
    output: Option<&Path>,
) -> CharlaResult<()> {
    let transcript = store.load(name).await?;
    let document = export_transcript(&transcript)?;

    match output {
        Some(path) if path == Path::new("-") => println!("{}", document),
        Some(path) => write_export(path, &document)?,
        None => write_export(Path::new(&export_file_name(Some(name))), &document)?,
    }
    Ok(())
}

fn write_export(path: &Path, document: &str) -> CharlaResult<()> {
    std::fs::write(path, document)?;
    CliConsole::new(true).success(&format!("Exported to {}", path.display()));
    Ok(())
}

/// Import an exported chat into the store
pub async fn import(
    store: &LocalSessionStore,
    file: &Path,
    name: Option<&str>,
) -> CharlaResult<()> {
    let bytes = tokio::fs::read(file).await?;
    let transcript = import_transcript(&bytes)?;

    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let requested = name
        .map(naming::sanitize_name)
        .filter(|n| !n.is_empty())
        .or_else(|| import_name(file_name));

    // Never clobber an existing chat on import
    let existing: HashSet<String> = store.list().await?.into_iter().collect();
    let target = match requested {
        Some(requested) => naming::unique_name(&requested, &existing),
        None => store.resolve_name(None, &transcript).await?,
    };

    let stored = store.save(Some(&target), &transcript).await?;
    CliConsole::new(true).success(&format!(
        "Imported {} message(s) as '{}'.",
        transcript.len(),
        stored
    ));
    Ok(())
}

/// Print the name a chat file would be saved under
pub async fn suggest_name(store: &LocalSessionStore, file: &Path) -> CharlaResult<()> {
    let bytes = tokio::fs::read(file).await?;
    let transcript = import_transcript(&bytes)?;

    let base = naming::derive_name(&transcript);
    let name = store.resolve_name(None, &transcript).await?;
    println!("{}", name);
    if name != base {
        CliConsole::new(true).info(&format!("'{}' is taken; suffixed to avoid overwriting", base));
    }
    Ok(())
}

/// Format relative time like "5 minutes ago", "2 hours ago", etc.
pub fn format_relative_time(time: DateTime<Utc>) -> String {
    let now = Utc::now();
    let duration = now.signed_duration_since(time);

    if duration.num_seconds() < 60 {
        "just now".to_string()
    } else if duration.num_minutes() < 60 {
        let mins = duration.num_minutes();
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if duration.num_hours() < 24 {
        let hours = duration.num_hours();
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if duration.num_days() < 7 {
        let days = duration.num_days();
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        let weeks = duration.num_weeks();
        format!("{} week{} ago", weeks, if weeks == 1 { "" } else { "s" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_format_relative_time() {
        let now = Utc::now();
        assert_eq!(format_relative_time(now), "just now");
        assert_eq!(format_relative_time(now - Duration::minutes(1)), "1 min ago");
        assert_eq!(format_relative_time(now - Duration::hours(3)), "3 hours ago");
        assert_eq!(format_relative_time(now - Duration::days(2)), "2 days ago");
        assert_eq!(format_relative_time(now - Duration::days(15)), "2 weeks ago");
    }

    #[tokio::test]
    async fn test_import_does_not_clobber() {
        let temp = TempDir::new().unwrap();
        let store = LocalSessionStore::with_path(temp.path().join("chats"));
        let file = temp.path().join("viaje.json");
        std::fs::write(&file, r#"[{"role": "user", "content": "planear viaje a Lima"}]"#)
            .unwrap();

        import(&store, &file, None).await.unwrap();
        import(&store, &file, None).await.unwrap();

        let mut names = store.list().await.unwrap();
        names.sort();
        assert_eq!(names, vec!["viaje", "viaje_01"]);
    }

    #[tokio::test]
    async fn test_import_rejects_bad_documents() {
        let temp = TempDir::new().unwrap();
        let store = LocalSessionStore::with_path(temp.path().join("chats"));
        let file = temp.path().join("bad.json");
        std::fs::write(&file, r#"{"role": "user"}"#).unwrap();

        assert!(import(&store, &file, None).await.is_err());
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_writes_document() {
        let temp = TempDir::new().unwrap();
        let store = LocalSessionStore::with_path(temp.path().join("chats"));
        let mut transcript = Transcript::new();
        transcript.add_user_message("exportame");
        store.save(Some("gatos"), &transcript).await.unwrap();

        let out = temp.path().join("out.json");
        export(&store, "gatos", Some(&out)).await.unwrap();
        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(import_transcript(written.as_bytes()).unwrap(), transcript);
    }
}
