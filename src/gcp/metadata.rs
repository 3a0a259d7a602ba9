//! GCE metadata service lookups.
//!
//! Resolves the cluster identity (project, location, name) once at startup
//! and hands out access tokens for the monitoring push.

use serde::Deserialize;

use crate::error::{OomWatchError, Result};

const METADATA_BASE: &str = "http://metadata.google.internal/computeMetadata/v1";

/// Cluster identity resolved once at startup; read-only for the rest of
/// the process lifetime.
#[derive(Debug, Clone)]
pub struct ScanContext {
    pub project_id: String,
    pub cluster_location: String,
    pub cluster_name: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Client for the node-local metadata service.
#[derive(Clone)]
pub struct MetadataClient {
    http: reqwest::Client,
    base_url: String,
}

impl MetadataClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_base_url(http, METADATA_BASE)
    }

    pub fn with_base_url(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let url = format!("{}/{path}", self.base_url);
        let response = self
            .http
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OomWatchError::Metadata {
                path: path.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response)
    }

    async fn get_text(&self, path: &str) -> Result<String> {
        Ok(self.get(path).await?.text().await?)
    }

    /// Resolve the cluster identity for the lifetime of the process.
    pub async fn resolve_context(&self) -> Result<ScanContext> {
        Ok(ScanContext {
            project_id: self.get_text("project/project-id").await?,
            cluster_location: self
                .get_text("instance/attributes/cluster-location")
                .await?,
            cluster_name: self.get_text("instance/attributes/cluster-name").await?,
        })
    }

    /// Fetch an access token for the node's default service account.
    pub async fn access_token(&self) -> Result<String> {
        let token: TokenResponse = self
            .get("instance/service-accounts/default/token")
            .await?
            .json()
            .await?;

        Ok(token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::spawn_stub;

    #[tokio::test]
    async fn test_resolve_context_reads_identity_paths() {
        let (base_url, mut requests) = spawn_stub(|path| {
            let value = match path {
                "/project/project-id" => "acme-prod",
                "/instance/attributes/cluster-location" => "europe-west1",
                "/instance/attributes/cluster-name" => "main",
                _ => return (404, "not found".to_string()),
            };
            (200, value.to_string())
        })
        .await;

        let client = MetadataClient::with_base_url(reqwest::Client::new(), base_url);
        let context = client.resolve_context().await.expect("context resolves");

        assert_eq!(context.project_id, "acme-prod");
        assert_eq!(context.cluster_location, "europe-west1");
        assert_eq!(context.cluster_name, "main");

        let first = requests.recv().await.expect("request captured");
        assert!(first.to_lowercase().contains("metadata-flavor: google"));
    }

    #[tokio::test]
    async fn test_failed_lookup_names_the_path() {
        let (base_url, _requests) = spawn_stub(|_| (404, "not found".to_string())).await;
        let client = MetadataClient::with_base_url(reqwest::Client::new(), base_url);

        match client.resolve_context().await {
            Err(OomWatchError::Metadata { path, status }) => {
                assert_eq!(path, "project/project-id");
                assert_eq!(status, 404);
            }
            other => panic!("expected metadata error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_access_token_parsed_from_response() {
        let (base_url, mut requests) = spawn_stub(|path| match path {
            "/instance/service-accounts/default/token" => (
                200,
                r#"{"access_token":"tok-123","expires_in":3599,"token_type":"Bearer"}"#.to_string(),
            ),
            _ => (404, "not found".to_string()),
        })
        .await;

        let client = MetadataClient::with_base_url(reqwest::Client::new(), base_url);
        let token = client.access_token().await.expect("token resolves");

        assert_eq!(token, "tok-123");
        let request = requests.recv().await.expect("request captured");
        assert!(request.starts_with("GET /instance/service-accounts/default/token"));
    }
}
