// SharePoint REST client (_api/web)

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Deserializer};
use tracing::{debug, info};

use super::auth::{acquire_app_token, SharePointAuth};
use super::{SharePointError, SharePointSource};
use crate::models::RemoteFileDescriptor;

const ODATA_JSON: &str = "application/json;odata=nometadata";

enum Credential {
    Basic { username: String, password: String },
    Bearer(String),
}

pub struct SharePointClient {
    client: Client,
    site_url: String,
    credential: Credential,
}

#[derive(Deserialize)]
struct FileListResponse {
    value: Vec<FileEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FileEntry {
    name: String,
    server_relative_url: String,
    #[serde(deserialize_with = "number_or_string")]
    length: u64,
    #[serde(default)]
    time_created: Option<DateTime<Utc>>,
    #[serde(default)]
    time_last_modified: Option<DateTime<Utc>>,
}

impl From<FileEntry> for RemoteFileDescriptor {
    fn from(entry: FileEntry) -> Self {
        RemoteFileDescriptor {
            name: entry.name,
            path: entry.server_relative_url,
            size: entry.length,
            time_created: entry.time_created,
            time_modified: entry.time_last_modified,
        }
    }
}

/// SharePoint serializes `Length` as a string ("1234"); accept both forms
fn number_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Characters that would otherwise end or reshape the request path.
/// `/` stays literal; `'` is handled by OData quoting.
const PATH_LITERAL: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'?')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'\\')
    .add(b'^')
    .add(b'[')
    .add(b']');

/// Single quotes inside an OData string literal are doubled, then the literal is
/// percent-encoded so names containing `#`, `%` or `?` survive URL parsing
fn odata_literal(value: &str) -> String {
    utf8_percent_encode(&value.replace('\'', "''"), PATH_LITERAL).to_string()
}

impl SharePointClient {
    /// Resolve credentials and verify them against the site before any listing happens
    pub async fn connect(site_url: &str, auth: &SharePointAuth, timeout: Duration) -> Result<Self, SharePointError> {
        let site_url = site_url.trim_end_matches('/').to_string();
        if !(site_url.starts_with("https://") || site_url.starts_with("http://")) {
            return Err(SharePointError::InvalidSiteUrl(site_url));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SharePointError::Client(e.to_string()))?;

        let credential = match auth {
            SharePointAuth::UserCredential { username, password } => Credential::Basic {
                username: username.clone(),
                password: password.clone(),
            },
            SharePointAuth::AppCredential {
                client_id,
                client_secret,
                tenant_id,
                authority_url,
            } => Credential::Bearer(
                acquire_app_token(&client, &site_url, client_id, client_secret, tenant_id, authority_url).await?,
            ),
        };

        let sp = Self {
            client,
            site_url,
            credential,
        };
        sp.verify().await?;

        match auth {
            SharePointAuth::UserCredential { .. } => info!(site = %sp.site_url, "Connected to SharePoint site"),
            SharePointAuth::AppCredential { .. } => {
                info!(site = %sp.site_url, "Connected to SharePoint site using Azure AD")
            }
        }
        Ok(sp)
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    fn get(&self, url: &str) -> RequestBuilder {
        let builder = self.client.get(url).header("Accept", ODATA_JSON);
        match &self.credential {
            Credential::Basic { username, password } => builder.basic_auth(username, Some(password)),
            Credential::Bearer(token) => builder.bearer_auth(token),
        }
    }

    async fn verify(&self) -> Result<(), SharePointError> {
        let url = format!("{}/_api/web?$select=Title", self.site_url);
        let response = self
            .get(&url)
            .send()
            .await
            .map_err(|e| SharePointError::Authentication(format!("cannot reach {}: {}", self.site_url, e)))?;

        match response.status() {
            s if s.is_success() => Ok(()),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(SharePointError::Authentication(format!(
                "{} rejected the credentials ({})",
                self.site_url,
                response.status()
            ))),
            s => Err(SharePointError::Authentication(format!(
                "unexpected response from {} ({})",
                self.site_url, s
            ))),
        }
    }
}

#[async_trait]
impl SharePointSource for SharePointClient {
    async fn list_files(&self, folder: &str) -> Result<Vec<RemoteFileDescriptor>, SharePointError> {
        let folder = folder.trim_start_matches('/');
        let url = format!(
            "{}/_api/web/GetFolderByServerRelativeUrl('{}')/Files",
            self.site_url,
            odata_literal(folder)
        );
        let folder_error = |message: String| SharePointError::FolderAccess {
            folder: folder.to_string(),
            message,
        };

        let response = self
            .get(&url)
            .send()
            .await
            .map_err(|e| folder_error(format!("request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SharePointError::Authentication(format!(
                "access to folder '{}' denied ({})",
                folder, status
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(folder_error(format!("{}: {}", status, body.trim())));
        }

        let listing: FileListResponse = response
            .json()
            .await
            .map_err(|e| folder_error(format!("unexpected listing format: {}", e)))?;

        let files: Vec<RemoteFileDescriptor> = listing.value.into_iter().map(Into::into).collect();
        info!(folder = %folder, count = files.len(), "Listed SharePoint folder");
        Ok(files)
    }

    async fn download(&self, file: &RemoteFileDescriptor) -> Result<Vec<u8>, SharePointError> {
        let url = format!(
            "{}/_api/web/GetFileByServerRelativeUrl('{}')/$value",
            self.site_url,
            odata_literal(&file.path)
        );
        let download_error = |message: String| SharePointError::Download {
            path: file.path.clone(),
            message,
        };

        let response = self
            .get(&url)
            .send()
            .await
            .map_err(|e| download_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(download_error(format!("server returned {}", status)));
        }

        let bytes = response.bytes().await.map_err(|e| download_error(e.to_string()))?;
        debug!(file = %file.name, bytes = bytes.len(), "Downloaded file");
        Ok(bytes.to_vec())
    }
}
