//! Cloud Monitoring time-series push.
//!
//! Each detected OOM kill becomes one boolean point on a custom metric,
//! tagged with the cluster identity and the pod that was killed.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::error::{OomWatchError, Result};
use crate::gcp::metadata::{MetadataClient, ScanContext};
use crate::k8s::oom::OomEvent;

const MONITORING_BASE: &str = "https://monitoring.googleapis.com";

/// Custom metric written once per detected OOM kill.
pub const OOM_METRIC_TYPE: &str = "custom.googleapis.com/gke_oom_kills";

/// Sink for OOM events. Push failures surface as values so a namespace's
/// scan outcome can carry them.
#[async_trait]
pub trait MetricEmitter: Send + Sync {
    async fn emit(&self, context: &ScanContext, event: &OomEvent) -> Result<()>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTimeSeriesRequest {
    time_series: Vec<TimeSeries>,
}

#[derive(Debug, Serialize)]
struct TimeSeries {
    metric: Metric,
    resource: MonitoredResource,
    points: Vec<Point>,
}

#[derive(Debug, Serialize)]
struct Metric {
    r#type: String,
}

#[derive(Debug, Serialize)]
struct MonitoredResource {
    r#type: String,
    labels: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
struct Point {
    interval: TimeInterval,
    value: TypedValue,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TimeInterval {
    end_time: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TypedValue {
    bool_value: bool,
}

/// Pushes OOM events to Cloud Monitoring, authenticating with access
/// tokens from the metadata service. Built once at startup and shared by
/// every scan task.
pub struct MonitoringClient {
    http: reqwest::Client,
    metadata: MetadataClient,
    base_url: String,
}

impl MonitoringClient {
    pub fn new(http: reqwest::Client, metadata: MetadataClient) -> Self {
        Self::with_base_url(http, metadata, MONITORING_BASE)
    }

    pub fn with_base_url(
        http: reqwest::Client,
        metadata: MetadataClient,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            metadata,
            base_url: base_url.into(),
        }
    }

    fn build_series(context: &ScanContext, event: &OomEvent, end_time: String) -> TimeSeries {
        let mut labels = BTreeMap::new();
        labels.insert("project_id".to_string(), context.project_id.clone());
        labels.insert("location".to_string(), context.cluster_location.clone());
        labels.insert("cluster_name".to_string(), context.cluster_name.clone());
        labels.insert("namespace_name".to_string(), event.namespace.clone());
        labels.insert("pod_name".to_string(), event.pod_name.clone());

        TimeSeries {
            metric: Metric {
                r#type: OOM_METRIC_TYPE.to_string(),
            },
            resource: MonitoredResource {
                r#type: "k8s_pod".to_string(),
                labels,
            },
            points: vec![Point {
                interval: TimeInterval { end_time },
                value: TypedValue { bool_value: true },
            }],
        }
    }
}

#[async_trait]
impl MetricEmitter for MonitoringClient {
    async fn emit(&self, context: &ScanContext, event: &OomEvent) -> Result<()> {
        let token = self.metadata.access_token().await?;
        let end_time = Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true);
        let request = CreateTimeSeriesRequest {
            time_series: vec![Self::build_series(context, event, end_time)],
        };

        let url = format!(
            "{}/v3/projects/{}/timeSeries",
            self.base_url, context.project_id
        );
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OomWatchError::MonitoringStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
