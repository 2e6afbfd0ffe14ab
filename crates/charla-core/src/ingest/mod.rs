//! Attachment ingestion
//!
//! Uploaded files are dispatched by declared extension to an
//! [`AttachmentKind`], and each kind is served by an independent
//! [`Extractor`] adapter. Ingestion never fails: a file that cannot be
//! read degrades to empty text plus a warning.

mod extractors;

pub use extractors::{CsvExtractor, TextExtractor};
#[cfg(feature = "docx")]
pub use extractors::DocxExtractor;
#[cfg(feature = "pdf")]
pub use extractors::PdfExtractor;
#[cfg(feature = "xlsx")]
pub use extractors::SpreadsheetExtractor;

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Extracted text beyond this many characters is dropped
pub const MAX_ATTACHMENT_CHARS: usize = 10_000;

/// What an uploaded file is, as far as extraction is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentKind {
    Image,
    Pdf,
    Docx,
    Spreadsheet,
    Csv,
    Code,
    PlainText,
}

impl AttachmentKind {
    pub const ALL: [AttachmentKind; 7] = [
        AttachmentKind::Image,
        AttachmentKind::Pdf,
        AttachmentKind::Docx,
        AttachmentKind::Spreadsheet,
        AttachmentKind::Csv,
        AttachmentKind::Code,
        AttachmentKind::PlainText,
    ];

    /// Extensions (lowercase, no dot) that resolve to this kind
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Image => &["png", "jpg", "jpeg", "svg", "bmp", "gif"],
            Self::Pdf => &["pdf"],
            Self::Docx => &["docx"],
            Self::Spreadsheet => &["xlsx", "xls"],
            Self::Csv => &["csv"],
            Self::Code => &[
                "py", "html", "css", "js", "json", "xml", "md", "rs", "toml", "yaml", "yml",
            ],
            Self::PlainText => &["txt", "rtf", "log"],
        }
    }

    /// Resolve a declared extension (case-insensitive, leading dot allowed)
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.trim_start_matches('.').to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.extensions().contains(&extension.as_str()))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Pdf => "PDF",
            Self::Docx => "Word document",
            Self::Spreadsheet => "spreadsheet",
            Self::Csv => "CSV",
            Self::Code => "code",
            Self::PlainText => "text",
        }
    }
}

impl fmt::Display for AttachmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Extraction adapter failure
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ExtractError(String);

impl ExtractError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<std::io::Error> for ExtractError {
    fn from(e: std::io::Error) -> Self {
        Self(e.to_string())
    }
}

/// Turns the raw bytes of one kind of file into plain text
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Adapter name for logs
    fn name(&self) -> &str;

    async fn extract(&self, bytes: Vec<u8>) -> Result<String, ExtractError>;
}

/// Outcome of ingesting one uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub file_name: String,
    /// Declared extension, lowercase
    pub extension: String,
    pub kind: Option<AttachmentKind>,
    pub text: String,
    /// Whether `text` was cut to the configured limit
    pub truncated: bool,
    /// Set when extraction failed; `text` is then empty
    pub warning: Option<String>,
}

impl Extraction {
    fn failed(
        file_name: &str,
        extension: String,
        kind: Option<AttachmentKind>,
        warning: String,
    ) -> Self {
        warn!("Attachment '{}' not ingested: {}", file_name, warning);
        Self {
            file_name: file_name.to_string(),
            extension,
            kind,
            text: String::new(),
            truncated: false,
            warning: Some(warning),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.warning.is_none()
    }
}

/// Adapters keyed by attachment kind
pub struct ExtractorRegistry {
    adapters: HashMap<AttachmentKind, Arc<dyn Extractor>>,
    max_chars: usize,
}

impl ExtractorRegistry {
    /// Registry with no adapters
    pub fn empty(max_chars: usize) -> Self {
        Self {
            adapters: HashMap::new(),
            max_chars,
        }
    }

    /// Registry with the built-in adapters.
    ///
    /// Images have no built-in adapter, and the spreadsheet adapter only
    /// reads `.xlsx` workbooks; register one (e.g. an OCR bridge) to accept
    /// more.
    pub fn with_defaults(max_chars: usize) -> Self {
        let mut registry = Self::empty(max_chars);
        registry.register(AttachmentKind::PlainText, TextExtractor);
        registry.register(AttachmentKind::Code, TextExtractor);
        registry.register(AttachmentKind::Csv, CsvExtractor);
        #[cfg(feature = "docx")]
        registry.register(AttachmentKind::Docx, DocxExtractor);
        #[cfg(feature = "xlsx")]
        registry.register(AttachmentKind::Spreadsheet, SpreadsheetExtractor);
        #[cfg(feature = "pdf")]
        registry.register(AttachmentKind::Pdf, PdfExtractor);
        registry
    }

    /// Install (or replace) the adapter for a kind
    pub fn register(&mut self, kind: AttachmentKind, adapter: impl Extractor + 'static) {
        self.adapters.insert(kind, Arc::new(adapter));
    }

    pub fn supports(&self, kind: AttachmentKind) -> bool {
        self.adapters.contains_key(&kind)
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Extract the text of an uploaded file
    pub async fn ingest(&self, file_name: &str, bytes: Vec<u8>) -> Extraction {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();

        let Some(kind) = AttachmentKind::from_extension(&extension) else {
            return Extraction::failed(
                file_name,
                extension.clone(),
                None,
                format!("unsupported file type '.{}'", extension),
            );
        };

        let Some(adapter) = self.adapters.get(&kind) else {
            return Extraction::failed(
                file_name,
                extension,
                Some(kind),
                format!("no extractor available for {} files", kind),
            );
        };

        match adapter.extract(bytes).await {
            Ok(text) => {
                let (text, truncated) = truncate_chars(&text, self.max_chars);
                debug!(
                    "Extracted {} chars from '{}' with {} (truncated: {})",
                    text.chars().count(),
                    file_name,
                    adapter.name(),
                    truncated
                );
                Extraction {
                    file_name: file_name.to_string(),
                    extension,
                    kind: Some(kind),
                    text,
                    truncated,
                    warning: None,
                }
            }
            Err(e) => Extraction::failed(
                file_name,
                extension,
                Some(kind),
                format!("{} failed: {}", adapter.name(), e),
            ),
        }
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults(MAX_ATTACHMENT_CHARS)
    }
}

/// Keep at most `max_chars` characters of `text`
pub fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => (text[..cut].to_string(), true),
        None => (text.to_string(), false),
    }
}

/// Context block appended to the user message that carries attachments.
///
/// Failed extractions are left out. Returns an empty string when nothing
/// usable was attached.
pub fn attachment_context(extractions: &[Extraction]) -> String {
    let usable: Vec<&Extraction> = extractions.iter().filter(|e| e.is_ok()).collect();
    if usable.is_empty() {
        return String::new();
    }

    let mut context = String::from("\n\nContexto de archivos subidos:\n");
    for extraction in usable {
        context.push_str(&format!(
            "\n--- {} ({}) ---\n{}\n",
            extraction.file_name, extraction.extension, extraction.text
        ));
    }
    context
}
