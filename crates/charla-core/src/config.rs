//! Configuration loading
//!
//! Settings come from an optional JSON file, then `CHARLA_*` environment
//! variables, and are validated before use.

use crate::error::{CharlaError, CharlaResult};
use crate::ingest::MAX_ATTACHMENT_CHARS;
use crate::models;
use charla_session::LocalSessionStore;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default configuration file name used by the CLI
pub const DEFAULT_CONFIG_FILE: &str = "charla_config.json";

/// Greeting seeded into every new chat
pub const DEFAULT_GREETING: &str = "¡Hola! Sube archivos y pregúntame sobre ellos.";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding chat records (default `~/.charla/chats`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chats_dir: Option<PathBuf>,

    /// Model used for new turns
    pub default_model: String,

    /// Assistant greeting seeded into new chats
    pub greeting: String,

    /// Save named chats after every completed turn
    pub auto_save: bool,

    /// Attachment text beyond this many characters is dropped
    pub max_attachment_chars: usize,

    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chats_dir: None,
            default_model: models::default_model().to_string(),
            greeting: DEFAULT_GREETING.to_string(),
            auto_save: true,
            max_attachment_chars: MAX_ATTACHMENT_CHARS,
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load from `path` (if present), apply environment overrides, validate
    pub fn load(path: &Path) -> CharlaResult<Self> {
        let mut config = Self::load_from_file(path)?;
        config.apply_env_with(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    ///
    /// Returns default config if the file doesn't exist.
    pub fn load_from_file(path: &Path) -> CharlaResult<Self> {
        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            CharlaError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            CharlaError::config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Apply `CHARLA_*` overrides read through `lookup`
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) -> CharlaResult<()> {
        if let Some(dir) = lookup("CHARLA_CHATS_DIR") {
            self.chats_dir = Some(PathBuf::from(dir));
        }

        if let Some(model) = lookup("CHARLA_MODEL") {
            self.default_model = model;
        }

        if let Some(auto_save) = lookup("CHARLA_AUTO_SAVE") {
            self.auto_save = auto_save
                .parse()
                .map_err(|_| CharlaError::config("Invalid CHARLA_AUTO_SAVE value"))?;
        }

        if let Some(level) = lookup("CHARLA_LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }

        Ok(())
    }

    /// Validate a complete configuration
    pub fn validate(&self) -> CharlaResult<()> {
        if self.default_model.trim().is_empty() {
            return Err(CharlaError::config("default_model must not be empty"));
        }

        if self.max_attachment_chars == 0 {
            return Err(CharlaError::config(
                "max_attachment_chars must be greater than zero",
            ));
        }

        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(CharlaError::config(format!(
                "Unknown log level '{}'. Valid levels are: {:?}",
                self.logging.level, VALID_LOG_LEVELS
            )));
        }

        Ok(())
    }

    /// Directory that holds chat records, with `~/` expanded
    pub fn chats_dir(&self) -> CharlaResult<PathBuf> {
        let home = || {
            dirs::home_dir().ok_or_else(|| CharlaError::config("Home directory not available"))
        };

        match &self.chats_dir {
            Some(dir) => match dir.strip_prefix("~") {
                Ok(rest) => Ok(home()?.join(rest)),
                Err(_) => Ok(dir.clone()),
            },
            None => Ok(home()?.join(".charla").join("chats")),
        }
    }

    /// Open the local chat store this configuration points at
    pub fn open_store(&self) -> CharlaResult<LocalSessionStore> {
        Ok(LocalSessionStore::with_path(self.chats_dir()?))
    }

    /// Write the configuration as pretty JSON
    pub fn save_to_file(&self, path: &Path) -> CharlaResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
