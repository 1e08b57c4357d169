use std::env;
use std::str::FromStr;

use serde::Deserialize;

use crate::llm::AiProviderConfig;
use crate::sharepoint::SharePointAuth;
use crate::types::{AppError, AppResult};

pub const DEFAULT_SUPPORTED_FILE_TYPES: &[&str] = &[
    ".txt", ".pdf", ".docx", ".doc", ".xlsx", ".xls", ".pptx", ".ppt", ".md", ".csv", ".json",
    ".xml",
];

const DEFAULT_AUTHORITY_URL: &str = "https://login.microsoftonline.com";
const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub sharepoint: SharePointConfig,
    pub ai: AiConfig,
    pub app: AppSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SharePointConfig {
    pub site_url: String,
    pub username: String,
    pub password: String,
    pub client_id: String,
    pub client_secret: String,
    pub tenant_id: String,
    pub authority_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_api_base: String,
    pub azure_endpoint: String,
    pub azure_api_key: String,
    pub azure_deployment: String,
    pub azure_api_version: String,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    pub max_file_size_mb: u64,
    pub output_filename: String,
    /// Lower-case extensions without the leading dot
    pub supported_file_types: Vec<String>,
    pub max_content_chars: usize,
    pub http_timeout_secs: u64,
    pub log_dir: Option<String>,
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).unwrap_or_default();
        let var_or = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Ok(Self {
            sharepoint: SharePointConfig {
                site_url: var("SHAREPOINT_SITE_URL").trim_end_matches('/').to_string(),
                username: var("SHAREPOINT_USERNAME"),
                password: var("SHAREPOINT_PASSWORD"),
                client_id: var("SHAREPOINT_CLIENT_ID"),
                client_secret: var("SHAREPOINT_CLIENT_SECRET"),
                tenant_id: var("SHAREPOINT_TENANT_ID"),
                authority_url: var_or("SHAREPOINT_AUTHORITY_URL", DEFAULT_AUTHORITY_URL)
                    .trim_end_matches('/')
                    .to_string(),
            },
            ai: AiConfig {
                openai_api_key: var("OPENAI_API_KEY"),
                openai_model: var_or("OPENAI_MODEL", "gpt-4o-mini"),
                openai_api_base: var_or("OPENAI_API_BASE", DEFAULT_OPENAI_API_BASE)
                    .trim_end_matches('/')
                    .to_string(),
                azure_endpoint: var("AZURE_OPENAI_ENDPOINT").trim_end_matches('/').to_string(),
                azure_api_key: var("AZURE_OPENAI_API_KEY"),
                azure_deployment: var("AZURE_OPENAI_DEPLOYMENT"),
                azure_api_version: var_or("AZURE_OPENAI_API_VERSION", "2024-02-01"),
                max_retries: parse_var("AI_MAX_RETRIES", &var_or("AI_MAX_RETRIES", "0"))?,
                retry_base_delay_ms: parse_var(
                    "AI_RETRY_BASE_DELAY_MS",
                    &var_or("AI_RETRY_BASE_DELAY_MS", "1000"),
                )?,
            },
            app: AppSettings {
                max_file_size_mb: parse_var("MAX_FILE_SIZE_MB", &var_or("MAX_FILE_SIZE_MB", "10"))?,
                output_filename: var_or("OUTPUT_FILENAME", "sharepoint_file_analysis.xlsx"),
                supported_file_types: match lookup("SUPPORTED_FILE_TYPES") {
                    Some(list) if !list.trim().is_empty() => parse_extension_list(&list),
                    _ => parse_extension_list(&DEFAULT_SUPPORTED_FILE_TYPES.join(",")),
                },
                max_content_chars: parse_var(
                    "MAX_CONTENT_CHARS",
                    &var_or("MAX_CONTENT_CHARS", "8000"),
                )?,
                http_timeout_secs: parse_var(
                    "HTTP_TIMEOUT_SECS",
                    &var_or("HTTP_TIMEOUT_SECS", "120"),
                )?,
                log_dir: lookup("LOG_DIR").filter(|v| !v.trim().is_empty()),
            },
        })
    }

    /// Human-readable list of everything that prevents a run
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.sharepoint.site_url.is_empty() {
            errors.push("SHAREPOINT_SITE_URL is not set".to_string());
        }
        if self.sharepoint.auth().is_none() {
            errors.push(
                "SharePoint authentication credentials not set (username/password or Azure AD)"
                    .to_string(),
            );
        }
        if self.ai.provider().is_none() {
            errors.push("AI API credentials not set (OpenAI or Azure OpenAI)".to_string());
        }
        if self.app.supported_file_types.is_empty() {
            errors.push("SUPPORTED_FILE_TYPES is empty".to_string());
        }
        if self.app.max_content_chars == 0 {
            errors.push("MAX_CONTENT_CHARS must be greater than zero".to_string());
        }

        errors
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.app.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

impl SharePointConfig {
    /// User credentials win over app credentials when both are present
    pub fn auth(&self) -> Option<SharePointAuth> {
        if !self.username.is_empty() && !self.password.is_empty() {
            return Some(SharePointAuth::UserCredential {
                username: self.username.clone(),
                password: self.password.clone(),
            });
        }
        if !self.client_id.is_empty() && !self.client_secret.is_empty() && !self.tenant_id.is_empty() {
            return Some(SharePointAuth::AppCredential {
                client_id: self.client_id.clone(),
                client_secret: self.client_secret.clone(),
                tenant_id: self.tenant_id.clone(),
                authority_url: self.authority_url.clone(),
            });
        }
        None
    }

    pub fn has_credentials(&self) -> bool {
        self.auth().is_some()
    }
}

impl AiConfig {
    pub fn is_using_azure(&self) -> bool {
        !self.azure_endpoint.is_empty()
            && !self.azure_api_key.is_empty()
            && !self.azure_deployment.is_empty()
    }

    /// Azure OpenAI is selected when its endpoint, key and deployment are all set
    pub fn provider(&self) -> Option<AiProviderConfig> {
        if self.is_using_azure() {
            Some(AiProviderConfig::Azure {
                endpoint: self.azure_endpoint.clone(),
                api_key: self.azure_api_key.clone(),
                deployment: self.azure_deployment.clone(),
                api_version: self.azure_api_version.clone(),
            })
        } else if !self.openai_api_key.is_empty() {
            Some(AiProviderConfig::OpenAI {
                api_key: self.openai_api_key.clone(),
                model: self.openai_model.clone(),
                api_base: self.openai_api_base.clone(),
            })
        } else {
            None
        }
    }
}

fn parse_var<T: FromStr>(key: &str, raw: &str) -> AppResult<T> {
    raw.parse()
        .map_err(|_| AppError::Config(format!("{} has an invalid value: '{}'", key, raw)))
}

/// Accepts ".pdf, DOCX,txt" style lists
pub fn parse_extension_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppResult<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.ai.openai_model, "gpt-4o-mini");
        assert_eq!(config.ai.azure_api_version, "2024-02-01");
        assert_eq!(config.ai.max_retries, 0);
        assert_eq!(config.app.max_file_size_mb, 10);
        assert_eq!(config.app.output_filename, "sharepoint_file_analysis.xlsx");
        assert_eq!(config.app.max_content_chars, 8000);
        assert_eq!(config.app.supported_file_types.len(), 12);
        assert!(config.app.supported_file_types.contains(&"pptx".to_string()));
        assert_eq!(config.max_file_size_bytes(), 10 * 1024 * 1024);
    }

    #[test]
    fn test_validate_reports_every_missing_piece() {
        let config = config_from(&[]).unwrap();
        let errors = config.validate();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].contains("SHAREPOINT_SITE_URL"));
    }

    #[test]
    fn test_validate_ok_with_app_credentials_and_openai() {
        let config = config_from(&[
            ("SHAREPOINT_SITE_URL", "https://contoso.sharepoint.com/sites/docs/"),
            ("SHAREPOINT_CLIENT_ID", "id"),
            ("SHAREPOINT_CLIENT_SECRET", "secret"),
            ("SHAREPOINT_TENANT_ID", "tenant"),
            ("OPENAI_API_KEY", "sk-test"),
        ])
        .unwrap();
        assert!(config.validate().is_empty());
        assert_eq!(config.sharepoint.site_url, "https://contoso.sharepoint.com/sites/docs");
        assert!(matches!(
            config.sharepoint.auth(),
            Some(SharePointAuth::AppCredential { .. })
        ));
        assert!(matches!(config.ai.provider(), Some(AiProviderConfig::OpenAI { .. })));
    }

    #[test]
    fn test_user_credentials_take_precedence() {
        let config = config_from(&[
            ("SHAREPOINT_USERNAME", "alice@contoso.com"),
            ("SHAREPOINT_PASSWORD", "pw"),
            ("SHAREPOINT_CLIENT_ID", "id"),
            ("SHAREPOINT_CLIENT_SECRET", "secret"),
            ("SHAREPOINT_TENANT_ID", "tenant"),
        ])
        .unwrap();
        assert!(matches!(
            config.sharepoint.auth(),
            Some(SharePointAuth::UserCredential { .. })
        ));
    }

    #[test]
    fn test_azure_requires_endpoint_key_and_deployment() {
        let partial = config_from(&[
            ("AZURE_OPENAI_ENDPOINT", "https://res.openai.azure.com"),
            ("AZURE_OPENAI_API_KEY", "key"),
            ("OPENAI_API_KEY", "sk-test"),
        ])
        .unwrap();
        assert!(!partial.ai.is_using_azure());
        assert!(matches!(partial.ai.provider(), Some(AiProviderConfig::OpenAI { .. })));

        let full = config_from(&[
            ("AZURE_OPENAI_ENDPOINT", "https://res.openai.azure.com/"),
            ("AZURE_OPENAI_API_KEY", "key"),
            ("AZURE_OPENAI_DEPLOYMENT", "gpt4o"),
            ("OPENAI_API_KEY", "sk-test"),
        ])
        .unwrap();
        match full.ai.provider() {
            Some(AiProviderConfig::Azure { endpoint, deployment, .. }) => {
                assert_eq!(endpoint, "https://res.openai.azure.com");
                assert_eq!(deployment, "gpt4o");
            }
            other => panic!("expected Azure provider, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_number_is_config_error() {
        let err = config_from(&[("MAX_FILE_SIZE_MB", "ten")]).unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.contains("MAX_FILE_SIZE_MB")));
    }

    #[test]
    fn test_parse_extension_list() {
        assert_eq!(
            parse_extension_list(".PDF, docx ,,.Txt"),
            vec!["pdf".to_string(), "docx".to_string(), "txt".to_string()]
        );
    }
}
