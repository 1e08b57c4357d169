// SharePoint File Analyzer - summarizes the documents of a SharePoint folder into an Excel report

pub mod agents;
pub mod cli;
pub mod config;
pub mod extraction;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod sharepoint;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use pipeline::{FileFilter, FileProcessor};
pub use report::ReportWriter;
pub use types::{AppError, AppResult};
