use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use sharepoint_analyzer::{
    agents::SummarizerAgent,
    cli::{self, Args, DEFAULT_FOLDER},
    extraction::ContentExtractor,
    llm::LLM,
    models::RunSummary,
    sharepoint::SharePointClient,
    utils::{init_logger, RetryPolicy},
    AppError, AppResult, Config, FileFilter, FileProcessor, ReportWriter,
};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    // Load configuration
    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(ExitCode::FAILURE);
        }
    };
    let _log_guard = init_logger(config.app.log_dir.as_deref());
    args.apply(&mut config);

    cli::print_banner();

    let interactive = args.is_interactive();
    if interactive && !config.sharepoint.has_credentials() {
        cli::prompt_for_credentials(&mut config)?;
    }

    let problems = config.validate();
    if !problems.is_empty() {
        cli::print_config_errors(&problems);
        return Ok(ExitCode::FAILURE);
    }

    let folder = match args.folder.as_deref().map(str::trim) {
        Some(folder) if !folder.is_empty() => folder.to_string(),
        _ if interactive => cli::prompt("Folder path", Some(DEFAULT_FOLDER))?,
        _ => DEFAULT_FOLDER.to_string(),
    };

    match run(&config, &folder).await {
        Ok(Some(summary)) => {
            cli::print_summary(&summary);
            Ok(ExitCode::SUCCESS)
        }
        Ok(None) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            error!(error = %e, "Run aborted");
            eprintln!("Error: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// One full pass; `None` when there was nothing to analyze
async fn run(config: &Config, folder: &str) -> AppResult<Option<RunSummary>> {
    let auth = config
        .sharepoint
        .auth()
        .ok_or_else(|| AppError::Config("SharePoint credentials not set".to_string()))?;
    let provider = config
        .ai
        .provider()
        .ok_or_else(|| AppError::Config("AI API credentials not set".to_string()))?;
    let timeout = Duration::from_secs(config.app.http_timeout_secs);

    let llm = LLM::from_config(&provider, timeout)?;
    info!(provider = %llm.provider(), model = %llm.model(), "AI provider configured");
    let summarizer = SummarizerAgent::new(
        llm,
        RetryPolicy::new(
            config.ai.max_retries,
            Duration::from_millis(config.ai.retry_base_delay_ms),
        ),
    );

    let client = SharePointClient::connect(&config.sharepoint.site_url, &auth, timeout).await?;
    let processor = FileProcessor::new(
        &client,
        FileFilter::from_settings(&config.app),
        ContentExtractor::new(config.app.max_content_chars),
        &summarizer,
    );

    let (files_found, outcome) = processor.discover(folder).await?;
    if files_found == 0 {
        println!("No files found in '{}'.", folder);
        return Ok(None);
    }
    if outcome.accepted.is_empty() {
        println!(
            "None of the {} files in '{}' match the supported types ({}) within {} MB.",
            files_found,
            folder,
            processor.filter().allowed_display().join(", "),
            config.app.max_file_size_mb
        );
        return Ok(None);
    }

    println!(
        "Found {} files, analyzing {} ({} skipped)",
        files_found,
        outcome.accepted.len(),
        outcome.skipped.len()
    );

    let progress = cli::progress_bar(outcome.accepted.len());
    let report = processor
        .process(client.site_url(), folder, &outcome.accepted, Some(&progress))
        .await;

    let writer = ReportWriter::new(&config.app.output_filename);
    writer.write(&report)?;

    Ok(Some(RunSummary {
        files_found,
        files_skipped: outcome.skipped.len(),
        files_processed: report.processed_count(),
        files_errored: report.errors.len(),
        output_path: writer.path().display().to_string(),
    }))
}
