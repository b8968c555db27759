//! Turns uploaded files into plain text for the model.
//!
//! Word documents and PDFs go through format-specific parsers that need a
//! path on disk; everything else is decoded as UTF-8.

mod docx;
mod pdf;
mod scratch;

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// File extensions the upload surfaces accept.
pub const SUPPORTED_EXTENSIONS: [&str; 17] = [
    "py", "js", "ts", "java", "cpp", "c", "html", "css", "json", "go", "rb", "php", "cs", "txt",
    "md", "docx", "pdf",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Docx,
    Pdf,
    PlainText,
}

impl DocumentKind {
    pub fn from_name(name: &str) -> Self {
        match extension_of(name).as_deref() {
            Some("docx") => Self::Docx,
            Some("pdf") => Self::Pdf,
            _ => Self::PlainText,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    Io(String),
    Pdf(String),
    Docx(String),
    /// The file parsed but holds no pages.
    Empty,
}

impl Display for ExtractionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "unable to stage file for parsing: {msg}"),
            Self::Pdf(msg) => write!(f, "invalid PDF document: {msg}"),
            Self::Docx(msg) => write!(f, "invalid Word document: {msg}"),
            Self::Empty => write!(f, "document has no readable pages"),
        }
    }
}

impl Error for ExtractionError {}

pub type ExtractionResult<T> = std::result::Result<T, ExtractionError>;


pub fn extract_text(name: &str, bytes: &[u8]) -> ExtractionResult<String> {
    match DocumentKind::from_name(name) {
        DocumentKind::Pdf => {
            scratch::with_scratch_copy(bytes, ".pdf", pdf::load_pages, ExtractionError::Pdf)
                .map(|pages| pages.join("\n"))
        }
        DocumentKind::Docx => {
            scratch::with_scratch_copy(bytes, ".docx", docx::load_paragraphs, ExtractionError::Docx)
                .map(|paragraphs| paragraphs.join("\n"))
        }
        DocumentKind::PlainText => Ok(decode_utf8_ignoring_invalid(bytes)),
    }
}

/// Message stored in place of document text when extraction fails.
pub fn failure_placeholder(name: &str, err: &ExtractionError) -> String {
    format!("⚠ Could not read {name}: {err}")
}

pub fn is_supported_upload(name: &str) -> bool {
    extension_of(name).is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

fn decode_utf8_ignoring_invalid(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}
