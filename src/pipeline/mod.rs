//! File processing pipeline
//!
//! Lists a folder, filters the listing, then handles each accepted file in
//! order: download, extract an excerpt, ask the summarizer for a title and
//! summary. A failure on one file is recorded against its row and the run moves
//! on; only listing failures abort.

pub mod accumulator;
pub mod filter;

pub use accumulator::RowAccumulator;
pub use filter::{FileFilter, FilterOutcome, SkipReason, SkippedFile};

use indicatif::ProgressBar;
use thiserror::Error;
use tracing::{debug, info};

use crate::agents::{DocumentSummary, SummarizerAgent};
use crate::extraction::{ContentExtractor, ExtractionError};
use crate::models::{ErrorKind, RemoteFileDescriptor, Report};
use crate::sharepoint::{SharePointError, SharePointSource};
use crate::types::{AppResult, ProviderError};

/// Reasons a single file ends up on the error sheet
#[derive(Debug, Error)]
pub enum FileError {
    #[error(transparent)]
    Download(SharePointError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl FileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FileError::Download(_) => ErrorKind::FileDownload,
            FileError::Extraction(_) => ErrorKind::FileExtraction,
            FileError::Provider(e) => ErrorKind::AiProvider(e.kind),
        }
    }
}

/// Result of a complete pass over one folder
#[derive(Debug)]
pub struct PipelineOutput {
    pub report: Report,
    pub files_found: usize,
    pub skipped: Vec<SkippedFile>,
}

pub struct FileProcessor<'a> {
    source: &'a dyn SharePointSource,
    filter: FileFilter,
    extractor: ContentExtractor,
    summarizer: &'a SummarizerAgent,
}

impl<'a> FileProcessor<'a> {
    pub fn new(
        source: &'a dyn SharePointSource,
        filter: FileFilter,
        extractor: ContentExtractor,
        summarizer: &'a SummarizerAgent,
    ) -> Self {
        Self {
            source,
            filter,
            extractor,
            summarizer,
        }
    }

    pub fn filter(&self) -> &FileFilter {
        &self.filter
    }

    /// Listing and filtering only; errors here are fatal
    pub async fn discover(&self, folder: &str) -> AppResult<(usize, FilterOutcome)> {
        let listing = self.source.list_files(folder).await?;
        let found = listing.len();
        let outcome = self.filter.apply(listing);

        for skipped in &outcome.skipped {
            match skipped.reason {
                SkipReason::UnsupportedExtension => {
                    debug!(file = %skipped.file.name, "Skipping unsupported file type")
                }
                SkipReason::TooLarge => debug!(
                    file = %skipped.file.name,
                    size_kb = skipped.file.size_kb(),
                    "Skipping file over the size limit"
                ),
            }
        }
        info!(
            folder = %folder,
            found,
            accepted = outcome.accepted.len(),
            skipped = outcome.skipped.len(),
            "Filtered folder listing"
        );

        Ok((found, outcome))
    }

    /// Process accepted files in order; every file yields exactly one row
    pub async fn process(
        &self,
        site_url: &str,
        folder: &str,
        files: &[RemoteFileDescriptor],
        progress: Option<&ProgressBar>,
    ) -> Report {
        let total = files.len();
        let mut rows = RowAccumulator::new();

        if let Some(pb) = progress {
            pb.set_length(total as u64);
        }

        for (index, file) in files.iter().enumerate() {
            if let Some(pb) = progress {
                pb.set_message(file.name.clone());
            }
            debug!(file = %file.name, position = index + 1, total, "Processing file");

            match self.process_file(file).await {
                Ok(summary) => rows.record_success(file, summary),
                // Failure details belong to the Errors sheet; the console only gets the final count
                Err(e) => {
                    let kind = e.kind();
                    debug!(file = %file.name, kind = %kind, error = %e, "File processing failed");
                    rows.record_failure(file, kind, e.to_string());
                }
            }

            if let Some(pb) = progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = progress {
            pb.finish_with_message("done");
        }

        rows.finish(site_url, folder)
    }

    /// Discover then process
    pub async fn run(
        &self,
        site_url: &str,
        folder: &str,
        progress: Option<&ProgressBar>,
    ) -> AppResult<PipelineOutput> {
        let (files_found, outcome) = self.discover(folder).await?;
        let report = self.process(site_url, folder, &outcome.accepted, progress).await;

        Ok(PipelineOutput {
            report,
            files_found,
            skipped: outcome.skipped,
        })
    }

    async fn process_file(&self, file: &RemoteFileDescriptor) -> Result<DocumentSummary, FileError> {
        let bytes = self.source.download(file).await.map_err(FileError::Download)?;
        let extension = file.extension();
        let content = self.extractor.extract(&file.name, &extension, &bytes)?;

        if content.is_empty() {
            debug!(file = %file.name, "No text extracted, recording metadata only");
            return Ok(DocumentSummary::metadata_only(&file.name, &extension));
        }

        Ok(self.summarizer.summarize(&content).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::SUMMARY_PLACEHOLDER;
    use crate::llm::{LLMAdapter, LLM};
    use crate::types::{
        AppError, LLMProvider, LLMRequest, LLMResponse, ProviderErrorKind, TokenUsage,
    };
    use crate::utils::logger::DEFAULT_FILTER;
    use crate::utils::retry::RetryPolicy;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;
    use std::io;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::EnvFilter;

    struct MemorySource {
        files: Vec<RemoteFileDescriptor>,
        content: HashMap<String, Vec<u8>>,
    }

    impl MemorySource {
        fn new(entries: &[(&str, &[u8])]) -> Self {
            let files = entries
                .iter()
                .map(|(name, bytes)| RemoteFileDescriptor {
                    name: name.to_string(),
                    path: format!("/Shared Documents/{}", name),
                    size: bytes.len() as u64,
                    time_created: None,
                    time_modified: Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()),
                })
                .collect();
            let content = entries
                .iter()
                .map(|(name, bytes)| (format!("/Shared Documents/{}", name), bytes.to_vec()))
                .collect();
            Self { files, content }
        }
    }

    #[async_trait]
    impl SharePointSource for MemorySource {
        async fn list_files(&self, folder: &str) -> Result<Vec<RemoteFileDescriptor>, SharePointError> {
            if folder == "Missing" {
                return Err(SharePointError::FolderAccess {
                    folder: folder.to_string(),
                    message: "404 Not Found".to_string(),
                });
            }
            Ok(self.files.clone())
        }

        async fn download(&self, file: &RemoteFileDescriptor) -> Result<Vec<u8>, SharePointError> {
            self.content
                .get(&file.path)
                .cloned()
                .ok_or_else(|| SharePointError::Download {
                    path: file.path.clone(),
                    message: "server returned 404 Not Found".to_string(),
                })
        }
    }

    /// Replies with `reply`, or fails with `failure` when set
    struct FixedAdapter {
        calls: Arc<AtomicU32>,
        reply: String,
        failure: Option<ProviderErrorKind>,
    }

    #[async_trait]
    impl LLMAdapter for FixedAdapter {
        async fn create_chat_completion(&self, _request: &LLMRequest) -> Result<LLMResponse, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(kind) = self.failure {
                return Err(ProviderError::new(LLMProvider::OpenAI, kind, "scripted failure"));
            }
            Ok(LLMResponse {
                content: self.reply.clone(),
                finish_reason: "stop".to_string(),
                usage: TokenUsage::default(),
            })
        }
    }

    fn summarizer(reply: &str, failure: Option<ProviderErrorKind>) -> (SummarizerAgent, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let adapter = FixedAdapter {
            calls: calls.clone(),
            reply: reply.to_string(),
            failure,
        };
        let llm = LLM::with_adapter(Box::new(adapter), LLMProvider::OpenAI, "gpt-4o-mini");
        (SummarizerAgent::new(llm, RetryPolicy::none()), calls)
    }

    fn default_filter() -> FileFilter {
        FileFilter::new(["txt", "pdf", "md", "docx"], 10)
    }

    const SITE: &str = "https://contoso.sharepoint.com/sites/docs";

    #[tokio::test]
    async fn test_mixed_folder_produces_one_row_per_accepted_file() {
        let source = MemorySource::new(&[
            ("a.txt", "Quarterly planning notes for the platform team.".as_bytes()),
            ("b.pdf", "%PDF-1.4 this is not really a pdf".as_bytes()),
            ("c.exe", "MZ".as_bytes()),
        ]);
        let (agent, calls) = summarizer(r#"{"title":"Planning Notes","summary":"Notes on planning."}"#, None);
        let processor = FileProcessor::new(&source, default_filter(), ContentExtractor::new(8000), &agent);

        let output = processor.run(SITE, "Shared Documents", None).await.unwrap();

        assert_eq!(output.files_found, 3);
        assert_eq!(output.skipped.len(), 1);
        assert_eq!(output.skipped[0].file.name, "c.exe");

        let report = output.report;
        assert_eq!(report.processed_count(), 2);
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].row, 1);
        assert_eq!(report.results[0].filename, "a.txt");
        assert_eq!(report.results[0].title, "Planning Notes");
        assert_eq!(report.results[0].last_modified_display(), "2024-01-15 10:30:00");

        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].row, 2);
        assert_eq!(report.errors[0].filename, "b.pdf");
        assert_eq!(report.errors[0].kind, ErrorKind::FileExtraction);

        // Only the text file reached the provider
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_title_uses_filename() {
        let source = MemorySource::new(&[("notes.md", "# Heading\n\nSome body text.".as_bytes())]);
        let (agent, _) = summarizer(r#"{"summary":"Only a summary."}"#, None);
        let processor = FileProcessor::new(&source, default_filter(), ContentExtractor::new(8000), &agent);

        let report = processor.run(SITE, "Shared Documents", None).await.unwrap().report;

        assert_eq!(report.results[0].title, "notes.md");
        assert_eq!(report.results[0].summary, SUMMARY_PLACEHOLDER);
        assert!(report.results[0].degraded);
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_is_recorded_and_run_continues() {
        let source = MemorySource::new(&[("a.txt", "first".as_bytes()), ("b.txt", "second".as_bytes())]);
        let (agent, calls) = summarizer("", Some(ProviderErrorKind::RateLimit));
        let processor = FileProcessor::new(&source, default_filter(), ContentExtractor::new(8000), &agent);

        let report = processor.run(SITE, "Shared Documents", None).await.unwrap().report;

        assert!(report.results.is_empty());
        assert_eq!(report.errors.len(), 2);
        assert_eq!(
            report.errors[1].kind,
            ErrorKind::AiProvider(ProviderErrorKind::RateLimit)
        );
        assert_eq!(report.errors[1].row, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_text_skips_provider() {
        let source = MemorySource::new(&[("blank.txt", "   \n\n  ".as_bytes())]);
        let (agent, calls) = summarizer(r#"{"title":"x","summary":"y"}"#, None);
        let processor = FileProcessor::new(&source, default_filter(), ContentExtractor::new(8000), &agent);

        let report = processor.run(SITE, "Shared Documents", None).await.unwrap().report;

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].title, "blank.txt");
        assert!(report.results[0].summary.starts_with("File type: .txt."));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_size_limit_excludes_file_from_processing() {
        let big = vec![b'a'; 2048];
        let source = MemorySource::new(&[("big.txt", big.as_slice())]);
        let (agent, calls) = summarizer(r#"{"title":"x","summary":"y"}"#, None);
        let filter = FileFilter::new(["txt"], 0).with_max_bytes(1024);
        let processor = FileProcessor::new(&source, filter, ContentExtractor::new(8000), &agent);

        let output = processor.run(SITE, "Shared Documents", None).await.unwrap();

        assert_eq!(output.skipped.len(), 1);
        assert_eq!(output.skipped[0].reason, SkipReason::TooLarge);
        assert_eq!(output.report.processed_count(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_listing_failure_is_fatal() {
        let source = MemorySource::new(&[]);
        let (agent, _) = summarizer("{}", None);
        let processor = FileProcessor::new(&source, default_filter(), ContentExtractor::new(8000), &agent);

        let err = processor.run(SITE, "Missing", None).await.unwrap_err();
        assert!(matches!(err, AppError::FolderAccess { .. }));
    }

    #[tokio::test]
    async fn test_download_failure_is_per_file() {
        let mut source = MemorySource::new(&[("a.txt", "hello".as_bytes()), ("gone.txt", "x".as_bytes())]);
        source.content.remove("/Shared Documents/gone.txt");
        let (agent, _) = summarizer(r#"{"title":"Hello","summary":"Greeting."}"#, None);
        let processor = FileProcessor::new(&source, default_filter(), ContentExtractor::new(8000), &agent);

        let report = processor.run(SITE, "Shared Documents", None).await.unwrap().report;

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.errors[0].filename, "gone.txt");
        assert_eq!(report.errors[0].kind, ErrorKind::FileDownload);
    }

    #[tokio::test]
    async fn test_progress_bar_tracks_files() {
        let source = MemorySource::new(&[("a.txt", "one".as_bytes()), ("b.txt", "two".as_bytes())]);
        let (agent, _) = summarizer(r#"{"title":"T","summary":"S"}"#, None);
        let processor = FileProcessor::new(&source, default_filter(), ContentExtractor::new(8000), &agent);
        let pb = ProgressBar::hidden();

        let (_, outcome) = processor.discover("Shared Documents").await.unwrap();
        processor.process(SITE, "Shared Documents", &outcome.accepted, Some(&pb)).await;

        assert_eq!(pb.position(), 2);
        assert_eq!(pb.length(), Some(2));
    }

    #[derive(Clone, Default)]
    struct CapturedWriter(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_default_log_level_keeps_per_file_failures_off_console() {
        let captured = CapturedWriter::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(DEFAULT_FILTER))
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let source = MemorySource::new(&[
            ("a.txt", "Quarterly planning notes.".as_bytes()),
            ("b.pdf", "%PDF-1.4 broken".as_bytes()),
            ("c.exe", "MZ".as_bytes()),
        ]);
        let (agent, _) = summarizer("", Some(ProviderErrorKind::Auth));
        let processor = FileProcessor::new(&source, default_filter(), ContentExtractor::new(8000), &agent);

        let report = processor.run(SITE, "Shared Documents", None).await.unwrap().report;
        assert_eq!(report.errors.len(), 2);

        let logged = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logged.contains("Filtered folder listing"), "{}", logged);
        for name in ["a.txt", "b.pdf", "c.exe", "scripted failure"] {
            assert!(!logged.contains(name), "{} leaked into: {}", name, logged);
        }
    }
}
