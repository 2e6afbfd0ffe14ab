//! Model-call boundary
//!
//! The hosted model is an external collaborator: a chat turn hands it the
//! role-tagged history and gets reply text back. Transport, retries and
//! credentials belong to the implementor.

use crate::error::CharlaResult;
use async_trait::async_trait;
use charla_session::{Role, Transcript};
use serde::Serialize;

/// A role-tagged message as sent to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Project a transcript onto the `{role, content}` pairs a model sees
    pub fn history(transcript: &Transcript) -> Vec<ChatMessage> {
        transcript
            .messages()
            .iter()
            .map(|m| ChatMessage {
                role: m.role,
                content: m.content.clone(),
            })
            .collect()
    }
}

/// Client for a hosted chat model
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate a reply to `messages` using `model_id`
    async fn complete(&self, model_id: &str, messages: &[ChatMessage]) -> CharlaResult<String>;
}
