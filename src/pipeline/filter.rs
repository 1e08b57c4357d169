// Extension and size filtering of a folder listing

use std::collections::HashSet;

use crate::config::AppSettings;
use crate::models::RemoteFileDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UnsupportedExtension,
    TooLarge,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub file: RemoteFileDescriptor,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    /// Files to process, in listing order
    pub accepted: Vec<RemoteFileDescriptor>,
    pub skipped: Vec<SkippedFile>,
}

impl FilterOutcome {
    pub fn total(&self) -> usize {
        self.accepted.len() + self.skipped.len()
    }
}

#[derive(Debug, Clone)]
pub struct FileFilter {
    allowed: HashSet<String>,
    max_size_bytes: u64,
}

impl FileFilter {
    /// `extensions` may be given with or without the leading dot, in any case
    pub fn new<I, S>(extensions: I, max_size_mb: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed: extensions
                .into_iter()
                .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
            max_size_bytes: max_size_mb.saturating_mul(1024 * 1024),
        }
    }

    pub fn from_settings(settings: &AppSettings) -> Self {
        Self::new(&settings.supported_file_types, settings.max_file_size_mb)
    }

    /// Byte ceiling given directly, used where MB granularity is too coarse
    pub fn with_max_bytes(mut self, max_size_bytes: u64) -> Self {
        self.max_size_bytes = max_size_bytes;
        self
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    /// Allowed extensions as ".ext", sorted for display
    pub fn allowed_display(&self) -> Vec<String> {
        let mut list: Vec<String> = self.allowed.iter().map(|e| format!(".{}", e)).collect();
        list.sort();
        list
    }

    pub fn check(&self, file: &RemoteFileDescriptor) -> Result<(), SkipReason> {
        if !self.allowed.contains(&file.extension()) {
            return Err(SkipReason::UnsupportedExtension);
        }
        if file.size > self.max_size_bytes {
            return Err(SkipReason::TooLarge);
        }
        Ok(())
    }

    pub fn apply(&self, files: Vec<RemoteFileDescriptor>) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();
        for file in files {
            match self.check(&file) {
                Ok(()) => outcome.accepted.push(file),
                Err(reason) => outcome.skipped.push(SkippedFile { file, reason }),
            }
        }
        outcome
    }
}
