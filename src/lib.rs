//! Charla: local chat transcript keeping
//!
//! Re-exports the session crate (records, naming, storage, transfer) and
//! the core crate (chat turns, attachment ingestion, configuration).

pub use charla_core as core;
pub use charla_session as session;

pub use charla_core::{
    ChatSession, CharlaError, CharlaResult, Config, ExtractorRegistry, ModelClient, TurnOutcome,
};
pub use charla_session::{LocalSessionStore, Message, Role, SessionStore, Transcript};
