// SharePoint credentials and app-only token acquisition

use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::info;

use super::SharePointError;

#[derive(Clone, PartialEq)]
pub enum SharePointAuth {
    /// Username and password, sent as HTTP basic credentials
    UserCredential { username: String, password: String },
    /// Azure AD application using the OAuth2 client-credentials grant
    AppCredential {
        client_id: String,
        client_secret: String,
        tenant_id: String,
        authority_url: String,
    },
}

// Secrets stay out of logs
impl std::fmt::Debug for SharePointAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SharePointAuth::UserCredential { username, .. } => f
                .debug_struct("UserCredential")
                .field("username", username)
                .finish_non_exhaustive(),
            SharePointAuth::AppCredential { client_id, tenant_id, .. } => f
                .debug_struct("AppCredential")
                .field("client_id", client_id)
                .field("tenant_id", tenant_id)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
}

/// `https://{site-host}/.default`
pub fn resource_scope(site_url: &str) -> Result<String, SharePointError> {
    let url = Url::parse(site_url).map_err(|_| SharePointError::InvalidSiteUrl(site_url.to_string()))?;
    let host = url
        .host_str()
        .ok_or_else(|| SharePointError::InvalidSiteUrl(site_url.to_string()))?;
    Ok(format!("https://{}/.default", host))
}

pub async fn acquire_app_token(
    client: &Client,
    site_url: &str,
    client_id: &str,
    client_secret: &str,
    tenant_id: &str,
    authority_url: &str,
) -> Result<String, SharePointError> {
    let scope = resource_scope(site_url)?;
    let token_url = format!("{}/{}/oauth2/v2.0/token", authority_url.trim_end_matches('/'), tenant_id);

    let response = client
        .post(&token_url)
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("scope", scope.as_str()),
        ])
        .send()
        .await
        .map_err(|e| SharePointError::Authentication(format!("token request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<TokenErrorResponse>(&body)
            .map(|e| format!("{}: {}", e.error, e.error_description))
            .unwrap_or(body);
        return Err(SharePointError::Authentication(format!("{} ({})", detail, status)));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| SharePointError::Authentication(format!("invalid token response: {}", e)))?;

    info!(tenant = %tenant_id, "Acquired app-only SharePoint token");
    Ok(token.access_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_scope_uses_site_host() {
        assert_eq!(
            resource_scope("https://contoso.sharepoint.com/sites/finance").unwrap(),
            "https://contoso.sharepoint.com/.default"
        );
        assert!(matches!(
            resource_scope("not a url"),
            Err(SharePointError::InvalidSiteUrl(_))
        ));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let auth = SharePointAuth::UserCredential {
            username: "alice".to_string(),
            password: "hunter2".to_string(),
        };
        let printed = format!("{:?}", auth);
        assert!(printed.contains("alice"));
        assert!(!printed.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_acquire_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/tenant-1/oauth2/v2.0/token")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("grant_type".into(), "client_credentials".into()),
                mockito::Matcher::UrlEncoded("client_id".into(), "app".into()),
                mockito::Matcher::UrlEncoded("scope".into(), "https://contoso.sharepoint.com/.default".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"token_type":"Bearer","expires_in":3599,"access_token":"tok-123"}"#)
            .create_async()
            .await;

        let token = acquire_app_token(
            &Client::new(),
            "https://contoso.sharepoint.com/sites/finance",
            "app",
            "secret",
            "tenant-1",
            &server.url(),
        )
        .await
        .unwrap();

        assert_eq!(token, "tok-123");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rejected_credentials() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/tenant-1/oauth2/v2.0/token")
            .with_status(401)
            .with_body(r#"{"error":"invalid_client","error_description":"bad secret"}"#)
            .create_async()
            .await;

        let err = acquire_app_token(
            &Client::new(),
            "https://contoso.sharepoint.com",
            "app",
            "wrong",
            "tenant-1",
            &server.url(),
        )
        .await
        .unwrap_err();

        match err {
            SharePointError::Authentication(msg) => assert!(msg.contains("invalid_client")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
