//! Content Extraction
//!
//! Turns the raw bytes of a downloaded file into a bounded plain-text excerpt
//! that fits into a completion prompt.
//!
//! ## Supported Formats
//! - Plain text: .txt, .log (direct decode)
//! - Markup: .md, .json, .xml, .html (direct decode)
//! - Delimited: .csv, .tsv via csv
//! - PDF: per-page text via lopdf
//! - Word: .docx text runs (OOXML via zip + quick-xml)
//! - Slides: .pptx text runs (OOXML via zip + quick-xml)
//! - Spreadsheets: .xlsx, .xls via calamine
//!
//! Legacy binary Office files (.doc, .ppt) are rejected with an
//! unsupported-format error.

pub mod office;
pub mod pdf;
pub mod plain_text;
pub mod spreadsheet;

use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::models::{ExtractedContent, ExtractionStatus};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("{format} content is corrupt or unreadable: {message}")]
    Corrupt { format: DocumentKind, message: String },

    #[error("{0} document is password-protected")]
    PasswordProtected(DocumentKind),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("{0} parser crashed on malformed input")]
    ParserPanic(DocumentKind),
}

impl ExtractionError {
    pub(crate) fn corrupt(format: DocumentKind, message: impl fmt::Display) -> Self {
        ExtractionError::Corrupt {
            format,
            message: message.to_string(),
        }
    }
}

/// Format family of a file, resolved from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    PlainText,
    Markup,
    Delimited { delimiter: u8 },
    Pdf,
    WordProcessor,
    Spreadsheet { legacy: bool },
    SlideDeck,
}

impl DocumentKind {
    /// Extensions without a dedicated strategy are read as plain text
    pub fn from_extension(ext: &str) -> Self {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "md" | "markdown" | "json" | "xml" | "html" | "htm" => DocumentKind::Markup,
            "csv" => DocumentKind::Delimited { delimiter: b',' },
            "tsv" => DocumentKind::Delimited { delimiter: b'\t' },
            "pdf" => DocumentKind::Pdf,
            "docx" | "doc" => DocumentKind::WordProcessor,
            "xlsx" | "xlsm" => DocumentKind::Spreadsheet { legacy: false },
            "xls" => DocumentKind::Spreadsheet { legacy: true },
            "pptx" | "ppt" => DocumentKind::SlideDeck,
            _ => DocumentKind::PlainText,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::PlainText => write!(f, "Text"),
            DocumentKind::Markup => write!(f, "Markup"),
            DocumentKind::Delimited { .. } => write!(f, "Delimited text"),
            DocumentKind::Pdf => write!(f, "PDF"),
            DocumentKind::WordProcessor => write!(f, "Word"),
            DocumentKind::Spreadsheet { .. } => write!(f, "Spreadsheet"),
            DocumentKind::SlideDeck => write!(f, "Presentation"),
        }
    }
}

/// Extracts and truncates document text; holds only the character budget
#[derive(Debug, Clone, Copy)]
pub struct ContentExtractor {
    max_chars: usize,
}

impl ContentExtractor {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Extract an excerpt from `bytes`, dispatching on the file extension
    pub fn extract(
        &self,
        filename: &str,
        extension: &str,
        bytes: &[u8],
    ) -> Result<ExtractedContent, ExtractionError> {
        let kind = DocumentKind::from_extension(extension);

        let raw = match kind {
            DocumentKind::PlainText | DocumentKind::Markup => plain_text::decode(bytes),
            DocumentKind::Delimited { delimiter } => plain_text::extract_delimited(bytes, delimiter)?,
            DocumentKind::Pdf => pdf::extract(bytes)?,
            DocumentKind::WordProcessor => office::extract_docx(bytes)?,
            DocumentKind::SlideDeck => office::extract_pptx(bytes)?,
            DocumentKind::Spreadsheet { legacy } => spreadsheet::extract(bytes, legacy)?,
        };

        let cleaned = clean_text(&raw);
        let original_chars = cleaned.chars().count();
        let (text, truncated) = truncate_chars(&cleaned, self.max_chars);

        let status = if text.trim().is_empty() {
            ExtractionStatus::Empty
        } else if truncated {
            ExtractionStatus::Truncated
        } else {
            ExtractionStatus::Complete
        };

        debug!(
            file = %filename,
            kind = %kind,
            chars = original_chars,
            status = ?status,
            "Extracted document text"
        );

        Ok(ExtractedContent {
            filename: filename.to_string(),
            kind,
            text,
            status,
            original_chars,
        })
    }
}

/// Trim trailing whitespace per line and collapse runs of blank lines
pub fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;

    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }

    out.trim().to_string()
}

/// Cut to at most `max_chars` characters; never splits a code point
pub fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (text[..byte_idx].to_string(), true),
        None => (text.to_string(), false),
    }
}
