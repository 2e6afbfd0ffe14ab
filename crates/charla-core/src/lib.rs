//! Core library for Charla
//!
//! Ties transcript persistence to a live chat: configuration, the
//! model-call boundary, attachment ingestion and the session state object
//! that runs one turn at a time.

pub mod chat;
pub mod config;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod models;

pub use chat::{ChatSession, TurnOutcome};
pub use config::{Config, DEFAULT_CONFIG_FILE, LoggingConfig};
pub use error::{CharlaError, CharlaResult, ErrorCategory};
pub use ingest::{AttachmentKind, Extraction, Extractor, ExtractorRegistry, attachment_context};
pub use llm::{ChatMessage, ModelClient};
pub use models::{MODELS, ModelInfo};
