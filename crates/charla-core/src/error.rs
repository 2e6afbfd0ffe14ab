//! Error types for Charla

use charla_session::StorageError;
use thiserror::Error;

/// Result type alias for Charla operations
pub type CharlaResult<T> = Result<T, CharlaError>;

/// Main error type for Charla
#[derive(Error, Debug)]
pub enum CharlaError {
    /// Transcript storage errors
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model client errors
    #[error("Model error ({model}): {message}")]
    Model { model: String, message: String },

    /// IO errors outside the transcript store
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON errors outside the transcript store
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Error category for user-facing messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A chat or file that does not exist
    NotFound,
    /// Stored or uploaded data that cannot be read back
    Corrupt,
    /// Storage medium unavailable
    FileSystem,
    /// Invalid user input
    UserInput,
    /// Configuration issues
    Configuration,
    /// Model call failures
    Model,
}

impl ErrorCategory {
    /// Get a user-friendly category name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::NotFound => "Not Found",
            Self::Corrupt => "Unreadable Chat",
            Self::FileSystem => "File System Error",
            Self::UserInput => "Invalid Input",
            Self::Configuration => "Configuration Error",
            Self::Model => "Model Error",
        }
    }
}

impl CharlaError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn model(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Model {
            model: model.into(),
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_not_found())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Storage(StorageError::NotFound(_)) => ErrorCategory::NotFound,
            Self::Storage(StorageError::Corrupt { .. }) | Self::Json(_) => ErrorCategory::Corrupt,
            Self::Storage(StorageError::Io(_))
            | Self::Storage(StorageError::PathUnavailable)
            | Self::Io(_) => ErrorCategory::FileSystem,
            Self::Storage(StorageError::Serialization(_)) => ErrorCategory::Corrupt,
            Self::Storage(StorageError::InvalidInput(_)) | Self::InvalidInput(_) => {
                ErrorCategory::UserInput
            }
            Self::Config(_) => ErrorCategory::Configuration,
            Self::Model { .. } => ErrorCategory::Model,
        }
    }

    /// One-line status message suitable for showing to the user
    pub fn user_message(&self) -> String {
        format!("{}: {}", self.category().display_name(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_errors_convert() {
        let err: CharlaError = StorageError::NotFound("gatos".into()).into();
        assert!(err.is_not_found());
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert_eq!(err.user_message(), "Not Found: Chat not found: gatos");
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            CharlaError::from(StorageError::corrupt("x", "bad")).category(),
            ErrorCategory::Corrupt
        );
        assert_eq!(
            CharlaError::invalid_input("empty name").category(),
            ErrorCategory::UserInput
        );
        assert_eq!(
            CharlaError::model("gemma2-9b-it", "timeout").to_string(),
            "Model error (gemma2-9b-it): timeout"
        );
        assert!(!CharlaError::config("bad").is_not_found());
    }
}
