//! Dropbox API v2 client.
//!
//! Implements [`RemoteStorage`] over the RPC endpoints. The access token is
//! taken as given; obtaining one is left to the caller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use dropsource_core::{EntryMetadata, FolderId, ProviderError, RemoteEntry, RemoteStorage};

/// Dropbox RPC endpoint base.
pub const API_BASE: &str = "https://api.dropboxapi.com/2";

/// Default timeout for a single API request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Longest error body kept in error messages.
const MAX_ERROR_BODY: usize = 300;

/// One page of `files/list_folder`.
#[derive(Debug, Deserialize)]
struct ListFolderResult {
    entries: Vec<RemoteEntry>,
    cursor: String,
    has_more: bool,
}

/// Response of `files/get_temporary_link`.
#[derive(Debug, Deserialize)]
struct TemporaryLink {
    link: String,
}

/// Dropbox storage client.
#[derive(Debug, Clone)]
pub struct DropboxClient {
    client: reqwest::Client,
    token: String,
    api_base: String,
}

impl DropboxClient {
    /// Create a client authenticating with a bearer token.
    pub fn new(token: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            token: token.into(),
            api_base: API_BASE.to_string(),
        }
    }

    /// Send requests to another endpoint base.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Make an RPC-style API call.
    async fn rpc_call<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &serde_json::Value,
    ) -> Result<T, ProviderError> {
        let url = format!("{}/{}", self.api_base, endpoint);

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            let text = response.text().await.unwrap_or_default();
            return Err(api_error(status.as_u16(), &text, retry_after));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }
}

#[async_trait]
impl RemoteStorage for DropboxClient {
    async fn get_metadata(&self, path: &str) -> Result<EntryMetadata, ProviderError> {
        let body = serde_json::json!({ "path": path });
        self.rpc_call("files/get_metadata", &body).await
    }

    async fn list_folder(
        &self,
        folder: &FolderId,
        recursive: bool,
    ) -> Result<Vec<RemoteEntry>, ProviderError> {
        let body = serde_json::json!({
            "path": folder.as_str(),
            "recursive": recursive,
            "include_deleted": false,
        });
        let mut page: ListFolderResult = self.rpc_call("files/list_folder", &body).await?;
        let mut entries = std::mem::take(&mut page.entries);

        while page.has_more {
            let body = serde_json::json!({ "cursor": page.cursor });
            page = self.rpc_call("files/list_folder/continue", &body).await?;
            entries.append(&mut page.entries);
        }

        tracing::debug!(target: "dropbox", folder = folder.as_str(), count = entries.len(), "listed folder");
        Ok(entries)
    }

    async fn temporary_link(&self, path: &str) -> Result<String, ProviderError> {
        let body = serde_json::json!({ "path": path });
        let link: TemporaryLink = self.rpc_call("files/get_temporary_link", &body).await?;
        Ok(link.link)
    }
}

/// Map a failed API response to a [`ProviderError`].
fn api_error(status: u16, body: &str, retry_after: Option<u64>) -> ProviderError {
    let message = truncate_body(body);
    match status {
        401 => ProviderError::Unauthorized(message),
        409 if body.contains("not_found") => ProviderError::NotFound(message),
        429 => ProviderError::RateLimited { retry_after },
        _ => ProviderError::Api { status, message },
    }
}

/// Bound an error body so responses never flood the logs.
fn truncate_body(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_folder_page_parses() {
        let json = r#"{
            "entries": [
                {".tag": "folder", "name": "docs", "path_lower": "/docs", "path_display": "/docs", "id": "id:2"},
                {".tag": "file", "name": "a.md", "path_lower": "/docs/a.md", "path_display": "/docs/a.md",
                 "id": "id:1", "client_modified": "2024-03-01T10:00:00Z", "server_modified": "2024-03-01T10:00:01Z",
                 "rev": "a1c10ce0dd78", "size": 7212, "content_hash": "e3b0c442"}
            ],
            "cursor": "ZtkX9_EHj3x7PMkVuFIhwKYXEpwpLwyxp9vMKomUhllil9q7eWiAu",
            "has_more": false
        }"#;
        let page: ListFolderResult = serde_json::from_str(json).unwrap();
        assert_eq!(page.entries.len(), 2);
        assert!(page.entries[0].is_folder());
        assert!(page.entries[1].client_modified.is_some());
        assert!(!page.has_more);
    }

    #[test]
    fn test_temporary_link_parses() {
        let json = r#"{"metadata": {".tag": "file", "name": "a.md"}, "link": "https://dl.dropboxusercontent.com/apitl/1/abc"}"#;
        let link: TemporaryLink = serde_json::from_str(json).unwrap();
        assert!(link.link.starts_with("https://"));
    }

    #[test]
    fn test_api_error_mapping() {
        assert!(matches!(api_error(401, "expired", None), ProviderError::Unauthorized(_)));
        assert!(matches!(
            api_error(409, r#"{"error_summary": "path/not_found/.."}"#, None),
            ProviderError::NotFound(_)
        ));
        assert!(matches!(
            api_error(429, "", Some(5)),
            ProviderError::RateLimited { retry_after: Some(5) }
        ));
        assert!(matches!(
            api_error(500, "boom", None),
            ProviderError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn test_truncate_body() {
        let long = "x".repeat(1000);
        assert!(truncate_body(&long).chars().count() <= MAX_ERROR_BODY + 1);
        assert_eq!(truncate_body("  short "), "short");
    }

    #[test]
    fn test_api_base_override() {
        let client = DropboxClient::new("t").with_api_base("http://localhost:8080/2/");
        assert_eq!(client.api_base, "http://localhost:8080/2");
    }
}
