use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use oomwatch::config::{self, Config};
use oomwatch::gcp::{MetadataClient, MonitoringClient};
use oomwatch::k8s::{ApiServerFetcher, K8sClient};
use oomwatch::scan::Orchestrator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting oomwatch v{}", oomwatch::VERSION);

    let config = Config::from_env().context("invalid configuration")?;

    let http = reqwest::Client::new();
    let metadata = MetadataClient::new(http.clone());
    let context = metadata
        .resolve_context()
        .await
        .context("failed to resolve cluster metadata")?;
    info!(
        project = %context.project_id,
        location = %context.cluster_location,
        cluster = %context.cluster_name,
        "resolved cluster identity"
    );

    let namespaces = K8sClient::try_default()
        .await
        .context("failed to create Kubernetes client")?;

    let fetcher = ApiServerFetcher::new(config::APISERVER, config::token_path(), &config::ca_path())
        .context("failed to load service account credentials")?;

    let metrics = MonitoringClient::new(http, metadata);

    let orchestrator = Orchestrator::new(
        context,
        Arc::new(namespaces),
        Arc::new(fetcher),
        Arc::new(metrics),
        config.interval,
    );

    orchestrator.run().await.context("scan loop terminated")?;
    Ok(())
}
