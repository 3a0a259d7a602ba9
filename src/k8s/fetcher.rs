//! Direct pod-status fetch against the cluster API server.
//!
//! The request authenticates with the mounted service-account token,
//! re-read on every call so a rotated token is picked up without a
//! restart, and validates the server against the mounted CA bundle.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use serde::Deserialize;
use tracing::debug;

use crate::error::{OomWatchError, Result};

/// Per-namespace pod status source.
#[async_trait]
pub trait PodFetcher: Send + Sync {
    async fn fetch_pods(&self, namespace: &str) -> Result<Vec<Pod>>;
}

#[derive(Debug, Deserialize)]
struct PodList {
    #[serde(default)]
    items: Vec<Pod>,
}

/// Fetches pod statuses over HTTPS with the service-account credentials.
///
/// The HTTP client is built once at startup; only the bearer token is
/// re-read per request.
pub struct ApiServerFetcher {
    http: reqwest::Client,
    base_url: String,
    token_path: PathBuf,
}

impl ApiServerFetcher {
    /// Build a fetcher trusting the given CA bundle. Fails if the bundle
    /// is missing or unparseable, which is fatal at startup.
    pub fn new(base_url: impl Into<String>, token_path: PathBuf, ca_path: &Path) -> Result<Self> {
        let bundle = std::fs::read(ca_path)?;
        let certificate = reqwest::Certificate::from_pem(&bundle)?;
        let http = reqwest::Client::builder()
            .add_root_certificate(certificate)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            token_path,
        })
    }

    /// Build a fetcher without a custom CA bundle, trusting the platform
    /// roots instead.
    pub fn without_ca(base_url: impl Into<String>, token_path: PathBuf) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            base_url: base_url.into(),
            token_path,
        })
    }
}

#[async_trait]
impl PodFetcher for ApiServerFetcher {
    async fn fetch_pods(&self, namespace: &str) -> Result<Vec<Pod>> {
        let token = tokio::fs::read_to_string(&self.token_path).await?;
        let url = format!("{}/api/v1/namespaces/{namespace}/pods", self.base_url);

        debug!(namespace = %namespace, "fetching pod statuses");

        let response = self
            .http
            .get(&url)
            .bearer_auth(token.trim_end())
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(OomWatchError::ApiServerStatus {
                status: status.as_u16(),
                body,
            });
        }

        let list: PodList = response.json().await?;
        Ok(list.items)
    }
}
