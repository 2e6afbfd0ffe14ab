//! Transcript data structures
//!
//! Defines the core types for chat persistence:
//! - Transcript: ordered, append-only message history of one conversation
//! - Message: a single role-tagged entry with its timestamp
//! - Timestamp: ISO-8601 instant kept verbatim for exact round-trips

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User message
    User,
    /// Assistant response
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ISO-8601 instant.
///
/// The text is kept exactly as it was read so a record written by an older
/// front end (naive local time, microsecond fraction) is written back
/// unchanged. Anything that does not parse as RFC 3339 or as a naive
/// `YYYY-MM-DDTHH:MM:SS[.f]` instant is rejected on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Timestamp(String);

impl Timestamp {
    /// Current local time in RFC 3339 with microseconds
    pub fn now() -> Self {
        Self(Local::now().to_rfc3339_opts(SecondsFormat::Micros, false))
    }

    /// Validate and wrap an ISO-8601 string
    pub fn parse(raw: &str) -> Option<Self> {
        parse_iso(raw).map(|_| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The instant expressed as local wall-clock time
    pub fn local(&self) -> Option<NaiveDateTime> {
        parse_iso(&self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Timestamp::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid ISO-8601 timestamp: {raw}")))
    }
}

fn parse_iso(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local).naive_local());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

/// Individual conversation message
///
/// Field order is the on-disk key order: `role`, `content`, `timestamp`,
/// `archivos`, `model`. Keys this type does not know are kept in `extra`
/// and written back after the known ones. An explicit `"archivos": null`
/// or `"model": null` is read as absent and dropped on write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message role
    pub role: Role,

    /// Message content
    pub content: String,

    /// Message timestamp (stamped on load when a record omits it)
    #[serde(default = "Timestamp::now")]
    pub timestamp: Timestamp,

    /// Names of the files attached to this message
    #[serde(rename = "archivos", default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<String>>,

    /// Model that produced this message (assistant only)
    #[serde(rename = "model", default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,

    /// Keys written by other front ends, preserved as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Timestamp::now(),
            attachments: None,
            model_id: None,
            extra: Map::new(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Timestamp::now(),
            attachments: None,
            model_id: None,
            extra: Map::new(),
        }
    }

    /// Attach file names to the message
    pub fn with_attachments(mut self, names: Vec<String>) -> Self {
        self.attachments = Some(names);
        self
    }

    /// Record the model that produced the message
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    /// Override the timestamp
    pub fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Ordered message history of one conversation
///
/// Serializes as a bare JSON array of messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Create a new empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transcript seeded with an assistant greeting
    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        let mut transcript = Self::new();
        transcript.push(Message::assistant(greeting));
        transcript
    }

    /// Append a message
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Append a user message
    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.push(Message::user(content));
    }

    /// Append an assistant message produced by `model_id`
    pub fn add_assistant_message(&mut self, content: impl Into<String>, model_id: impl Into<String>) {
        self.push(Message::assistant(content).with_model(model_id));
    }

    /// Get all messages as a slice
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Content of user-authored messages, in conversation order
    pub fn user_contents(&self) -> impl Iterator<Item = &str> {
        self.messages
            .iter()
            .filter(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Pretty JSON document (2-space indent, unicode left unescaped)
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a JSON document produced by [`Transcript::to_json`]
    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }
}

impl From<Vec<Message>> for Transcript {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_creation() {
        let transcript = Transcript::with_greeting("Hi! Upload files and ask me about them.");
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.messages()[0].role, Role::Assistant);
        assert!(Transcript::new().is_empty());
    }

    #[test]
    fn test_add_messages() {
        let mut transcript = Transcript::new();
        transcript.add_user_message("Hello");
        transcript.add_assistant_message("Hi there!", "gemma2-9b-it");

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.messages()[0].role, Role::User);
        assert_eq!(transcript.messages()[1].model_id.as_deref(), Some("gemma2-9b-it"));
        assert_eq!(transcript.user_contents().collect::<Vec<_>>(), vec!["Hello"]);
    }

    #[test]
    fn test_json_key_order_and_unicode() {
        let mut transcript = Transcript::new();
        transcript.push(
            Message::user("¿Qué es esto? 🤖")
                .with_attachments(vec!["notas.pdf".to_string()])
                .with_timestamp(Timestamp::parse("2024-05-01T10:15:30.123456").unwrap()),
        );

        let json = transcript.to_json().unwrap();
        let role = json.find("\"role\"").unwrap();
        let content = json.find("\"content\"").unwrap();
        let timestamp = json.find("\"timestamp\"").unwrap();
        let archivos = json.find("\"archivos\"").unwrap();
        assert!(role < content && content < timestamp && timestamp < archivos);
        assert!(json.contains("¿Qué es esto? 🤖"));
        assert!(!json.contains("\"model\""));
        assert!(json.starts_with("[\n  {"));
    }

    #[test]
    fn test_legacy_record_round_trips_verbatim() {
        let raw = r#"[
  {
    "role": "assistant",
    "content": "¡Hola! Sube archivos y pregúntame sobre ellos.",
    "timestamp": "2024-05-01T10:15:30.123456"
  },
  {
    "role": "user",
    "content": "hola",
    "timestamp": "2024-05-01T10:16:00.000001",
    "archivos": []
  },
  {
    "role": "assistant",
    "content": "¿En qué te ayudo?",
    "timestamp": "2024-05-01T10:16:02+02:00",
    "model": "compound-beta"
  }
]"#;
        let transcript = Transcript::from_json(raw).unwrap();
        assert_eq!(transcript.messages()[1].attachments, Some(vec![]));
        assert_eq!(transcript.to_json().unwrap(), raw);
    }

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let raw = r#"[
  {
    "role": "user",
    "content": "hola",
    "timestamp": "2024-05-01T10:16:00.000001",
    "archivos": [
      "notas.pdf"
    ],
    "pinned": true,
    "tokens": {
      "input": 12
    }
  }
]"#;
        let transcript = Transcript::from_json(raw).unwrap();
        let message = &transcript.messages()[0];
        assert_eq!(message.extra.get("pinned"), Some(&Value::Bool(true)));
        assert_eq!(message.attachments, Some(vec!["notas.pdf".to_string()]));
        assert_eq!(transcript.to_json().unwrap(), raw);
    }

    #[test]
    fn test_null_optional_keys_are_dropped() {
        let transcript = Transcript::from_json(
            r#"[{"role":"assistant","content":"hi","timestamp":"2024-05-01T10:16:00","archivos":null,"model":null}]"#,
        )
        .unwrap();
        let message = &transcript.messages()[0];
        assert_eq!(message.attachments, None);
        assert_eq!(message.model_id, None);
        assert!(message.extra.is_empty());

        let json = transcript.to_json().unwrap();
        assert!(!json.contains("archivos"));
        assert!(!json.contains("\"model\""));
    }

    #[test]
    fn test_missing_timestamp_is_stamped() {
        let transcript = Transcript::from_json(r#"[{"role":"user","content":"hi"}]"#).unwrap();
        assert!(transcript.messages()[0].timestamp.local().is_some());
    }

    #[test]
    fn test_rejects_bad_timestamp_and_role() {
        assert!(
            Transcript::from_json(r#"[{"role":"user","content":"x","timestamp":"yesterday"}]"#)
                .is_err()
        );
        assert!(Transcript::from_json(r#"[{"role":"system","content":"x"}]"#).is_err());
        assert!(Transcript::from_json(r#"[{"role":"user"}]"#).is_err());
    }

    #[test]
    fn test_timestamp_now_parses() {
        let now = Timestamp::now();
        assert!(now.local().is_some());
        assert!(Timestamp::parse(now.as_str()).is_some());
    }
}
