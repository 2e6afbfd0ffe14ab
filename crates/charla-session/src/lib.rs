//! Transcript persistence for Charla
//!
//! This crate provides:
//! - Transcript and message types with a stable JSON record format
//! - Default record names derived from conversation content
//! - Trait-based record storage (local directory, in-memory)
//! - Export/import of standalone JSON documents

pub mod naming;
pub mod session;
pub mod storage;
pub mod transfer;

pub use naming::{derive_name, derive_name_at, sanitize_name, unique_name};
pub use session::{Message, Role, Timestamp, Transcript};
pub use storage::{
    LocalSessionStore, MemorySessionStore, SessionStore, StorageError, StorageResult,
};
pub use transfer::{export_file_name, export_transcript, import_name, import_transcript};
