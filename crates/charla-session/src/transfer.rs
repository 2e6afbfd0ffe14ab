//! Export and import of transcripts as standalone JSON documents

use crate::naming::sanitize_name;
use crate::storage::{StorageError, StorageResult};
use crate::Transcript;
use serde_json::Value;
use std::path::Path;

/// File stem used when exporting a chat that has no name yet
pub const DEFAULT_EXPORT_NAME: &str = "chat_export";

const REQUIRED_FIELDS: [&str; 2] = ["role", "content"];

/// Serialize a transcript exactly as the store writes it
pub fn export_transcript(transcript: &Transcript) -> StorageResult<String> {
    Ok(transcript.to_json()?)
}

/// File name offered for a downloaded export
pub fn export_file_name(chat_name: Option<&str>) -> String {
    let stem = chat_name
        .map(sanitize_name)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_EXPORT_NAME.to_string());
    format!("{}.json", stem)
}

/// Parse an uploaded JSON document into a transcript.
///
/// The document must be an array of objects that each carry at least
/// `role` and `content`. Malformed JSON and unreadable messages are
/// `Corrupt`; a document of the wrong shape is `InvalidInput`.
pub fn import_transcript(bytes: &[u8]) -> StorageResult<Transcript> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| StorageError::corrupt("import", e))?;

    let items = value.as_array().ok_or_else(|| {
        StorageError::InvalidInput("invalid chat format: expected a JSON array".to_string())
    })?;

    for (index, item) in items.iter().enumerate() {
        let object = item.as_object().ok_or_else(|| {
            StorageError::InvalidInput(format!(
                "invalid chat format: message {} is not an object",
                index
            ))
        })?;
        if let Some(missing) = REQUIRED_FIELDS.iter().find(|f| !object.contains_key(**f)) {
            return Err(StorageError::InvalidInput(format!(
                "invalid chat format: message {} is missing '{}'",
                index, missing
            )));
        }
    }

    serde_json::from_value(value).map_err(|e| StorageError::corrupt("import", e))
}

/// Chat name for an imported file: its sanitized stem, if any survives
pub fn import_name(file_name: &str) -> Option<String> {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file_name);
    Some(sanitize_name(base)).filter(|name| !name.is_empty())
}
