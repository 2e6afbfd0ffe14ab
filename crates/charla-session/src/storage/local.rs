//! Local filesystem transcript storage
//!
//! Stores each transcript as `<name>.json` in a flat directory.

use super::{SessionStore, StorageError, StorageResult, check_name};
use crate::Transcript;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

const RECORD_EXTENSION: &str = "json";

/// Local filesystem transcript storage
///
/// Records are stored as JSON files in:
/// - `~/.charla/chats/` (default)
/// - Custom path if specified
pub struct LocalSessionStore {
    /// Base directory for record files
    base_path: PathBuf,

    /// Serializes writers so no two saves interleave on the same record
    write_lock: Mutex<()>,
}

impl LocalSessionStore {
    /// Create storage with default path (~/.charla/chats)
    pub fn new() -> StorageResult<Self> {
        let base_path = dirs::home_dir()
            .ok_or(StorageError::PathUnavailable)?
            .join(".charla")
            .join("chats");

        Ok(Self::with_path(base_path))
    }

    /// Create storage with custom base path
    pub fn with_path(base_path: PathBuf) -> Self {
        Self {
            base_path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Get file path for a record name
    pub fn record_path(&self, name: &str) -> PathBuf {
        self.base_path.join(format!("{}.{}", name, RECORD_EXTENSION))
    }

    /// Ensure storage directory exists
    async fn ensure_dir(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.base_path).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for LocalSessionStore {
    async fn write(&self, name: &str, transcript: &Transcript) -> StorageResult<()> {
        check_name(name)?;
        let content = transcript.to_json()?;

        let _guard = self.write_lock.lock().await;
        self.ensure_dir().await?;

        // Readers only ever see a complete record: write aside, then rename.
        let path = self.record_path(name);
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, content).await?;
        if let Err(e) = fs::rename(&tmp_path, &path).await {
            if let Err(cleanup) = fs::remove_file(&tmp_path).await {
                warn!("Failed to remove temp file {:?}: {}", tmp_path, cleanup);
            }
            return Err(e.into());
        }

        debug!("Saved chat '{}' to {:?}", name, path);
        Ok(())
    }

    async fn load(&self, name: &str) -> StorageResult<Transcript> {
        check_name(name)?;
        let path = self.record_path(name);

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::NotFound(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let transcript =
            Transcript::from_json(&content).map_err(|e| StorageError::corrupt(name, e))?;

        debug!("Loaded chat '{}' from {:?}", name, path);
        Ok(transcript)
    }

    async fn delete(&self, name: &str) -> StorageResult<bool> {
        check_name(name)?;
        let path = self.record_path(name);

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted chat '{}' at {:?}", name, path);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> StorageResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records: Vec<(String, Option<SystemTime>)> = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();

            // Only process .json files (skips in-flight .json.tmp files)
            if path.extension().and_then(|s| s.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                warn!("Skipping record with non UTF-8 name: {:?}", path);
                continue;
            };

            let modified = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata.modified().ok(),
                Ok(_) => continue,
                Err(e) => {
                    warn!("Failed to read metadata for {:?}: {}", path, e);
                    None
                }
            };
            records.push((name.to_string(), modified));
        }

        // Newest first; names break ties (and stand in for missing mtimes)
        records.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));

        Ok(records.into_iter().map(|(name, _)| name).collect())
    }

    async fn exists(&self, name: &str) -> StorageResult<bool> {
        check_name(name)?;
        Ok(fs::try_exists(self.record_path(name)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::derive_name;
    use std::time::Duration;
    use tempfile::TempDir;

    async fn create_test_storage() -> (LocalSessionStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalSessionStore::with_path(temp_dir.path().join("chats"));
        (storage, temp_dir)
    }

    fn conversation(question: &str) -> Transcript {
        let mut transcript = Transcript::with_greeting("Hi! Upload files and ask me about them.");
        transcript.add_user_message(question);
        transcript.add_assistant_message("Sure, here it is.", "compound-beta");
        transcript
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (storage, _temp) = create_test_storage().await;
        let transcript = conversation("hola, como estas?");

        let name = storage.save(None, &transcript).await.unwrap();
        assert_eq!(name, "hola_como_estas");

        let loaded = storage.load(&name).await.unwrap();
        assert_eq!(loaded, transcript);
        assert!(storage.record_path(&name).exists());
        assert!(!storage.record_path(&name).with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_save_long_non_ascii_prompt() {
        let (storage, _temp) = create_test_storage().await;
        let transcript = conversation(&"请告诉我关于猫的所有事情".repeat(20));

        let first = storage.save(None, &transcript).await.unwrap();
        let second = storage.save(None, &transcript).await.unwrap();
        assert_eq!(second, format!("{}_01", first));

        assert_eq!(storage.load(&first).await.unwrap(), transcript);
        assert_eq!(storage.load(&second).await.unwrap(), transcript);
    }

    #[tokio::test]
    async fn test_save_sanitizes_requested_name() {
        let (storage, _temp) = create_test_storage().await;
        let transcript = conversation("what is a monad");

        let name = storage.save(Some("chat/2024:test"), &transcript).await.unwrap();
        assert_eq!(name, "chat_2024_test");

        let name = storage.save(Some("  ***  "), &transcript).await.unwrap();
        assert_eq!(name, derive_name(&transcript));
    }

    #[tokio::test]
    async fn test_generated_names_do_not_overwrite() {
        let (storage, _temp) = create_test_storage().await;
        let transcript = conversation("contame sobre gatos");

        let first = storage.save(None, &transcript).await.unwrap();
        let second = storage.save(None, &transcript).await.unwrap();
        let third = storage.save(None, &transcript).await.unwrap();

        assert_eq!(first, "contame_sobre_gatos");
        assert_eq!(second, "contame_sobre_gatos_01");
        assert_eq!(third, "contame_sobre_gatos_02");
        assert_eq!(storage.list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_explicit_name_overwrites() {
        let (storage, _temp) = create_test_storage().await;

        storage.save(Some("daily"), &conversation("first question")).await.unwrap();
        let updated = conversation("second question");
        storage.save(Some("daily"), &updated).await.unwrap();

        assert_eq!(storage.list().await.unwrap(), vec!["daily".to_string()]);
        assert_eq!(storage.load("daily").await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let (storage, _temp) = create_test_storage().await;
        assert!(storage.list().await.unwrap().is_empty());

        for name in ["alpha", "beta", "gamma"] {
            storage.save(Some(name), &conversation(name)).await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        assert_eq!(storage.list().await.unwrap(), vec!["gamma", "beta", "alpha"]);

        // Re-saving bumps a record to the front
        storage.save(Some("alpha"), &conversation("alpha")).await.unwrap();
        assert_eq!(storage.list().await.unwrap()[0], "alpha");
    }

    #[tokio::test]
    async fn test_list_ignores_other_files() {
        let (storage, _temp) = create_test_storage().await;
        storage.save(Some("keep"), &conversation("keep me")).await.unwrap();
        std::fs::write(storage.base_path().join("notes.txt"), "x").unwrap();
        std::fs::write(storage.base_path().join("partial.json.tmp"), "[").unwrap();
        std::fs::create_dir(storage.base_path().join("folder.json")).unwrap();

        assert_eq!(storage.list().await.unwrap(), vec!["keep"]);
    }

    #[tokio::test]
    async fn test_delete() {
        let (storage, _temp) = create_test_storage().await;
        storage.save(Some("to delete"), &conversation("bye")).await.unwrap();
        assert!(storage.exists("to delete").await.unwrap());

        assert!(storage.delete("to delete").await.unwrap());
        assert!(!storage.exists("to delete").await.unwrap());
        assert!(!storage.delete("to delete").await.unwrap());
    }

    #[tokio::test]
    async fn test_not_found() {
        let (storage, _temp) = create_test_storage().await;

        let result = storage.load("nonexistent").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_corrupt_records() {
        let (storage, _temp) = create_test_storage().await;
        storage.ensure_dir().await.unwrap();

        std::fs::write(storage.record_path("broken"), "{ not json").unwrap();
        std::fs::write(
            storage.record_path("incomplete"),
            r#"[{"role": "user", "timestamp": "2024-01-01T00:00:00"}]"#,
        )
        .unwrap();

        for name in ["broken", "incomplete"] {
            let result = storage.load(name).await;
            assert!(matches!(result, Err(StorageError::Corrupt { .. })), "{name}");
        }
    }

    #[tokio::test]
    async fn test_rejects_path_like_names() {
        let (storage, _temp) = create_test_storage().await;

        assert!(matches!(
            storage.load("../secrets").await,
            Err(StorageError::InvalidInput(_))
        ));
        assert!(matches!(
            storage.delete("..").await,
            Err(StorageError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_rename() {
        let (storage, _temp) = create_test_storage().await;
        let transcript = conversation("rename me");
        storage.save(Some("old"), &transcript).await.unwrap();
        storage.save(Some("taken"), &transcript).await.unwrap();

        let renamed = storage.rename("old", "new: name").await.unwrap();
        assert_eq!(renamed, "new_ name");
        assert!(!storage.exists("old").await.unwrap());
        assert_eq!(storage.load("new_ name").await.unwrap(), transcript);

        assert!(matches!(
            storage.rename("new_ name", "taken").await,
            Err(StorageError::InvalidInput(_))
        ));
        assert!(matches!(
            storage.rename("missing", "other").await,
            Err(StorageError::NotFound(_))
        ));
    }
}
