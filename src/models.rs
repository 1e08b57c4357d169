// Data model shared by the pipeline, the SharePoint client and the report writer

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ProviderErrorKind;

/// Metadata for one file in a SharePoint folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteFileDescriptor {
    pub name: String,
    /// Server-relative URL, used to download the content
    pub path: String,
    pub size: u64,
    pub time_created: Option<DateTime<Utc>>,
    pub time_modified: Option<DateTime<Utc>>,
}

impl RemoteFileDescriptor {
    /// Lower-case extension without the dot, empty when the name has none
    pub fn extension(&self) -> String {
        std::path::Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default()
    }

    pub fn size_kb(&self) -> f64 {
        size_in_kb(self.size)
    }
}

/// Bytes to KB, rounded to two decimals
pub fn size_in_kb(bytes: u64) -> f64 {
    (bytes as f64 / 1024.0 * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionStatus {
    Complete,
    Truncated,
    /// Extraction succeeded but produced no visible text
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedContent {
    pub filename: String,
    pub kind: crate::extraction::DocumentKind,
    pub text: String,
    pub status: ExtractionStatus,
    /// Character count before truncation
    pub original_chars: usize,
}

impl ExtractedContent {
    pub fn is_truncated(&self) -> bool {
        self.status == ExtractionStatus::Truncated
    }

    pub fn is_empty(&self) -> bool {
        self.status == ExtractionStatus::Empty
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// 1-based position in the filtered listing
    pub row: usize,
    pub filename: String,
    pub title: String,
    pub summary: String,
    pub size: u64,
    pub time_modified: Option<DateTime<Utc>>,
    /// True when the AI response could not be used and fallback values were written
    pub degraded: bool,
}

impl AnalysisResult {
    pub fn size_kb(&self) -> f64 {
        size_in_kb(self.size)
    }

    pub fn last_modified_display(&self) -> String {
        self.time_modified
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default()
    }
}

/// Error label written to the report's error sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FileDownload,
    FileExtraction,
    AiProvider(ProviderErrorKind),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::FileDownload => write!(f, "FileDownloadError"),
            ErrorKind::FileExtraction => write!(f, "FileExtractionError"),
            ErrorKind::AiProvider(kind) => write!(f, "AIProviderError ({})", kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessingError {
    pub row: usize,
    pub filename: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Everything the report writer needs; built once by the accumulator
#[derive(Debug, Clone)]
pub struct Report {
    pub site_url: String,
    pub folder_path: String,
    pub generated_at: DateTime<Utc>,
    pub results: Vec<AnalysisResult>,
    pub errors: Vec<ProcessingError>,
}

impl Report {
    pub fn processed_count(&self) -> usize {
        self.results.len() + self.errors.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub files_found: usize,
    pub files_skipped: usize,
    pub files_processed: usize,
    pub files_errored: usize,
    pub output_path: String,
}
