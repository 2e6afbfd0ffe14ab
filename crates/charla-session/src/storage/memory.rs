//! In-memory transcript storage
//!
//! Keeps serialized records in a map; useful for tests and for hosts that
//! do not want to touch the filesystem.

use super::{SessionStore, StorageError, StorageResult, check_name};
use crate::Transcript;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

struct Record {
    json: String,
    revision: u64,
}

#[derive(Default)]
struct Records {
    entries: HashMap<String, Record>,
    clock: u64,
}

/// In-memory transcript storage
///
/// Records are stored as JSON text, so loaded transcripts are independent
/// snapshots of what was saved. A logical clock orders `list()`.
#[derive(Default)]
pub struct MemorySessionStore {
    records: RwLock<Records>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn write(&self, name: &str, transcript: &Transcript) -> StorageResult<()> {
        check_name(name)?;
        let json = transcript.to_json()?;

        let mut records = self.records.write().await;
        records.clock += 1;
        let revision = records.clock;
        records
            .entries
            .insert(name.to_string(), Record { json, revision });
        Ok(())
    }

    async fn load(&self, name: &str) -> StorageResult<Transcript> {
        let records = self.records.read().await;
        let record = records
            .entries
            .get(name)
            .ok_or_else(|| StorageError::NotFound(name.to_string()))?;

        Transcript::from_json(&record.json).map_err(|e| StorageError::corrupt(name, e))
    }

    async fn delete(&self, name: &str) -> StorageResult<bool> {
        Ok(self.records.write().await.entries.remove(name).is_some())
    }

    async fn list(&self) -> StorageResult<Vec<String>> {
        let records = self.records.read().await;
        let mut names: Vec<(&String, u64)> = records
            .entries
            .iter()
            .map(|(name, record)| (name, record.revision))
            .collect();
        names.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(a.0)));

        Ok(names.into_iter().map(|(name, _)| name.clone()).collect())
    }

    async fn exists(&self, name: &str) -> StorageResult<bool> {
        Ok(self.records.read().await.entries.contains_key(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(question: &str) -> Transcript {
        let mut transcript = Transcript::new();
        transcript.add_user_message(question);
        transcript.add_assistant_message("answer", "gemma2-9b-it");
        transcript
    }

    #[tokio::test]
    async fn test_round_trip() {
        let store = MemorySessionStore::new();
        let transcript = conversation("explain borrow checking");

        let name = store.save(None, &transcript).await.unwrap();
        assert_eq!(name, "explain_borrow_checking");
        assert_eq!(store.load(&name).await.unwrap(), transcript);
    }

    #[tokio::test]
    async fn test_list_orders_by_last_write() {
        let store = MemorySessionStore::new();
        for name in ["one", "two", "three"] {
            store.save(Some(name), &conversation(name)).await.unwrap();
        }
        assert_eq!(store.list().await.unwrap(), vec!["three", "two", "one"]);

        store.save(Some("one"), &conversation("again")).await.unwrap();
        assert_eq!(store.list().await.unwrap(), vec!["one", "three", "two"]);
    }

    #[tokio::test]
    async fn test_snapshots_are_independent() {
        let store = MemorySessionStore::new();
        let mut transcript = conversation("snapshot please");
        store.save(Some("snap"), &transcript).await.unwrap();

        transcript.add_user_message("added after save");
        assert_eq!(store.load("snap").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_and_missing() {
        let store = MemorySessionStore::new();
        store.save(Some("gone"), &conversation("bye")).await.unwrap();

        assert!(store.delete("gone").await.unwrap());
        assert!(!store.delete("gone").await.unwrap());
        assert!(store.load("gone").await.unwrap_err().is_not_found());
    }
}
