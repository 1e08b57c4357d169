//! SharePoint access
//!
//! The pipeline only needs two operations from SharePoint: list the files of a
//! folder and download one file. Both sit behind [`SharePointSource`] so the
//! pipeline can run against the REST client or an in-memory source.

pub mod auth;
pub mod client;

pub use auth::SharePointAuth;
pub use client::SharePointClient;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::RemoteFileDescriptor;
use crate::types::AppError;

#[derive(Debug, Error)]
pub enum SharePointError {
    #[error("SharePoint authentication failed: {0}")]
    Authentication(String),

    #[error("Cannot access folder '{folder}': {message}")]
    FolderAccess { folder: String, message: String },

    #[error("Download of '{path}' failed: {message}")]
    Download { path: String, message: String },

    #[error("Invalid site URL '{0}'")]
    InvalidSiteUrl(String),

    #[error("HTTP client error: {0}")]
    Client(String),
}

impl From<SharePointError> for AppError {
    fn from(err: SharePointError) -> Self {
        match err {
            SharePointError::Authentication(msg) => AppError::Authentication(msg),
            SharePointError::FolderAccess { folder, message } => AppError::FolderAccess { folder, message },
            SharePointError::InvalidSiteUrl(url) => AppError::Config(format!("Invalid SharePoint site URL '{}'", url)),
            other => AppError::Internal(other.to_string()),
        }
    }
}

#[async_trait]
pub trait SharePointSource: Send + Sync {
    /// Files directly inside `folder`, in the order the server returns them
    async fn list_files(&self, folder: &str) -> Result<Vec<RemoteFileDescriptor>, SharePointError>;

    async fn download(&self, file: &RemoteFileDescriptor) -> Result<Vec<u8>, SharePointError>;
}
