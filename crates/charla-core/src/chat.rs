//! Live chat session state
//!
//! A [`ChatSession`] owns the transcript being edited and the name it was
//! last saved under, and runs one request/response turn at a time.

use crate::config::Config;
use crate::error::{CharlaError, CharlaResult};
use crate::ingest::{Extraction, attachment_context};
use crate::llm::{ChatMessage, ModelClient};
use charla_session::{
    Message, SessionStore, Transcript, export_file_name, export_transcript, import_name,
    import_transcript, unique_name,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of one completed turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Model reply, as appended to the transcript
    pub reply: String,
    /// Name the transcript was auto-saved under, if it was
    pub saved_as: Option<String>,
    /// Status message when the auto-save failed
    pub save_warning: Option<String>,
}

/// The conversation currently being edited
pub struct ChatSession {
    store: Arc<dyn SessionStore>,
    transcript: Transcript,
    name: Option<String>,
    model: String,
    greeting: String,
    auto_save: bool,
}

impl ChatSession {
    /// Start an unsaved chat seeded with the configured greeting
    pub fn new(store: Arc<dyn SessionStore>, config: &Config) -> Self {
        Self {
            store,
            transcript: Transcript::with_greeting(config.greeting.clone()),
            name: None,
            model: config.default_model.clone(),
            greeting: config.greeting.clone(),
            auto_save: config.auto_save,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Name the chat is saved under, if any
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Drop the current chat and start a fresh, unsaved one
    pub fn new_chat(&mut self) {
        self.transcript = Transcript::with_greeting(self.greeting.clone());
        self.name = None;
    }

    /// Run one turn: append the user message (with any attachment
    /// context), ask the model, append its reply, then auto-save if the
    /// chat already has a name.
    ///
    /// When the model call fails the user message stays in the transcript
    /// and no reply is appended.
    pub async fn send(
        &mut self,
        client: &dyn ModelClient,
        prompt: &str,
        attachments: &[Extraction],
    ) -> CharlaResult<TurnOutcome> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(CharlaError::invalid_input("message is empty"));
        }

        let context = attachment_context(attachments);
        let content = if context.is_empty() {
            prompt.to_string()
        } else {
            format!("{}\n{}", prompt, context)
        };
        let file_names = attachments
            .iter()
            .filter(|a| a.is_ok())
            .map(|a| a.file_name.clone())
            .collect();
        self.transcript
            .push(Message::user(content).with_attachments(file_names));

        let history = ChatMessage::history(&self.transcript);
        debug!(
            "Sending {} messages to model {}",
            history.len(),
            self.model
        );
        let reply = client.complete(&self.model, &history).await?;
        self.transcript
            .push(Message::assistant(reply.clone()).with_model(self.model.clone()));

        let (saved_as, save_warning) = match self.auto_save().await {
            Ok(saved_as) => (saved_as, None),
            Err(e) => {
                warn!("Auto-save failed: {}", e);
                (None, Some(e.user_message()))
            }
        };

        Ok(TurnOutcome {
            reply,
            saved_as,
            save_warning,
        })
    }

    /// Save under the current name when auto-save is on and a name exists
    pub async fn auto_save(&mut self) -> CharlaResult<Option<String>> {
        if !self.auto_save || self.name.is_none() {
            return Ok(None);
        }
        let stored = self
            .store
            .save(self.name.as_deref(), &self.transcript)
            .await?;
        self.name = Some(stored.clone());
        Ok(Some(stored))
    }

    /// Name a save without an explicit name would use
    pub async fn suggested_name(&self) -> CharlaResult<String> {
        if let Some(name) = &self.name {
            return Ok(name.clone());
        }
        Ok(self.store.resolve_name(None, &self.transcript).await?)
    }

    /// Persist the chat and return the name it was stored under.
    ///
    /// Without an explicit name the current name is reused, or one is
    /// derived. With `start_new` the session then resets to a fresh chat.
    pub async fn save(&mut self, name: Option<&str>, start_new: bool) -> CharlaResult<String> {
        let requested = name.or(self.name.as_deref());
        let stored = self.store.save(requested, &self.transcript).await?;
        info!("Chat saved as '{}'", stored);

        if start_new {
            self.new_chat();
        } else {
            self.name = Some(stored.clone());
        }
        Ok(stored)
    }

    /// Replace the current chat with a stored one
    pub async fn load(&mut self, name: &str) -> CharlaResult<()> {
        let transcript = self.store.load(name).await?;
        self.transcript = transcript;
        self.name = Some(name.to_string());
        info!("Chat '{}' loaded", name);
        Ok(())
    }

    /// Delete a stored chat; the live transcript is kept but unnamed if it
    /// was the deleted one
    pub async fn delete(&mut self, name: &str) -> CharlaResult<bool> {
        let removed = self.store.delete(name).await?;
        if removed && self.name.as_deref() == Some(name) {
            self.name = None;
        }
        Ok(removed)
    }

    /// File name and JSON body for downloading the current chat
    pub fn export(&self) -> CharlaResult<(String, String)> {
        Ok((
            export_file_name(self.name.as_deref()),
            export_transcript(&self.transcript)?,
        ))
    }

    /// Replace the current chat with an uploaded document.
    ///
    /// The chat is named after the file, suffixed when a stored chat
    /// already has that name so later auto-saves cannot overwrite it. On
    /// any error the session is left untouched.
    pub async fn import(&mut self, file_name: &str, bytes: &[u8]) -> CharlaResult<()> {
        let transcript = import_transcript(bytes)?;
        let name = match import_name(file_name) {
            Some(requested) => {
                let existing: HashSet<String> = self.store.list().await?.into_iter().collect();
                Some(unique_name(&requested, &existing))
            }
            None => None,
        };

        self.transcript = transcript;
        self.name = name;
        info!(
            "Imported chat from '{}' as {:?}",
            file_name,
            self.name.as_deref()
        );
        Ok(())
    }
}
