//! Transcript storage abstraction and implementations
//!
//! Provides trait-based storage for transcript records with a local
//! filesystem implementation and an in-memory one.

mod local;
mod memory;

pub use local::LocalSessionStore;
pub use memory::MemorySessionStore;

use crate::Transcript;
use crate::naming::{derive_name, sanitize_name, unique_name};
use async_trait::async_trait;
use std::collections::HashSet;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Chat not found: {0}")]
    NotFound(String),

    #[error("Chat '{name}' is corrupt: {message}")]
    Corrupt { name: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage path not available")]
    PathUnavailable,
}

impl StorageError {
    pub fn corrupt(name: impl Into<String>, message: impl ToString) -> Self {
        Self::Corrupt {
            name: name.into(),
            message: message.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Reject keys that could address something outside the namespace
pub(crate) fn check_name(name: &str) -> StorageResult<()> {
    let escapes = name.contains(['/', '\\', '\0']) || name.chars().all(|c| c == '.');
    if name.trim().is_empty() || escapes {
        return Err(StorageError::InvalidInput(format!(
            "'{}' is not a valid chat name",
            name
        )));
    }
    Ok(())
}

/// Transcript storage trait for different backends
///
/// Backends provide the record primitives; naming policy (`save`,
/// `rename`) is shared and only talks to the backend through them.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Write a transcript under an already-sanitized name, replacing any
    /// previous record of that name
    async fn write(&self, name: &str, transcript: &Transcript) -> StorageResult<()>;

    /// Load a transcript by name
    async fn load(&self, name: &str) -> StorageResult<Transcript>;

    /// Delete a record; `Ok(false)` when there was nothing to delete
    async fn delete(&self, name: &str) -> StorageResult<bool>;

    /// Names of all records, most recently modified first
    async fn list(&self) -> StorageResult<Vec<String>>;

    /// Check if a record exists
    async fn exists(&self, name: &str) -> StorageResult<bool> {
        Ok(self.list().await?.iter().any(|n| n == name))
    }

    /// Save a transcript and return the name it was stored under.
    ///
    /// A requested name is sanitized and, when anything is left, used as-is
    /// (overwriting). Otherwise a name is derived from the transcript and
    /// suffixed until it is free.
    async fn save(&self, name: Option<&str>, transcript: &Transcript) -> StorageResult<String> {
        let name = self.resolve_name(name, transcript).await?;
        self.write(&name, transcript).await?;
        Ok(name)
    }

    /// Name that `save` would store the transcript under
    async fn resolve_name(
        &self,
        requested: Option<&str>,
        transcript: &Transcript,
    ) -> StorageResult<String> {
        if let Some(name) = requested.map(sanitize_name).filter(|n| !n.is_empty()) {
            return Ok(name);
        }

        let existing: HashSet<String> = self.list().await?.into_iter().collect();
        Ok(unique_name(&derive_name(transcript), &existing))
    }

    /// Move a record to a new (sanitized) name and return that name
    async fn rename(&self, from: &str, to: &str) -> StorageResult<String> {
        let target = sanitize_name(to);
        if target.is_empty() {
            return Err(StorageError::InvalidInput(format!(
                "'{}' is not a valid chat name",
                to
            )));
        }

        let transcript = self.load(from).await?;
        if target == from {
            return Ok(target);
        }
        if self.exists(&target).await? {
            return Err(StorageError::InvalidInput(format!(
                "a chat named '{}' already exists",
                target
            )));
        }

        self.write(&target, &transcript).await?;
        self.delete(from).await?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_name() {
        assert!(check_name("gatos").is_ok());
        assert!(check_name("my chat.v2").is_ok());
        assert!(check_name("").is_err());
        assert!(check_name("  ").is_err());
        assert!(check_name("..").is_err());
        assert!(check_name("../etc/passwd").is_err());
        assert!(check_name("a\\b").is_err());
    }

    #[test]
    fn test_error_helpers() {
        assert!(StorageError::NotFound("x".into()).is_not_found());
        let err = StorageError::corrupt("x", "expected value at line 1");
        assert!(!err.is_not_found());
        assert_eq!(
            err.to_string(),
            "Chat 'x' is corrupt: expected value at line 1"
        );
    }
}
