// Ordered bookkeeping of per-file outcomes

use chrono::Utc;

use crate::agents::DocumentSummary;
use crate::models::{AnalysisResult, ErrorKind, ProcessingError, RemoteFileDescriptor, Report};

/// Every recorded file takes the next 1-based row, whether it succeeded or failed
#[derive(Debug, Default)]
pub struct RowAccumulator {
    results: Vec<AnalysisResult>,
    errors: Vec<ProcessingError>,
    rows: usize,
}

impl RowAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&mut self, file: &RemoteFileDescriptor, summary: DocumentSummary) {
        self.rows += 1;
        self.results.push(AnalysisResult {
            row: self.rows,
            filename: file.name.clone(),
            title: summary.title,
            summary: summary.summary,
            size: file.size,
            time_modified: file.time_modified,
            degraded: summary.degraded,
        });
    }

    pub fn record_failure(&mut self, file: &RemoteFileDescriptor, kind: ErrorKind, message: impl Into<String>) {
        self.rows += 1;
        self.errors.push(ProcessingError {
            row: self.rows,
            filename: file.name.clone(),
            kind,
            message: message.into(),
        });
    }

    pub fn recorded(&self) -> usize {
        self.rows
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn finish(self, site_url: &str, folder_path: &str) -> Report {
        Report {
            site_url: site_url.to_string(),
            folder_path: folder_path.to_string(),
            generated_at: Utc::now(),
            results: self.results,
            errors: self.errors,
        }
    }
}
