//! The scan loop: fixed-interval fan-out across every namespace.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::error::{OomWatchError, Result};
use crate::gcp::metadata::ScanContext;
use crate::gcp::monitoring::MetricEmitter;
use crate::k8s::client::NamespaceLister;
use crate::k8s::fetcher::PodFetcher;
use crate::k8s::oom;

/// Result of one namespace's scan within a cycle.
#[derive(Debug)]
pub enum ScanOutcome {
    /// The namespace was scanned and `events` OOM kills were reported.
    Completed { namespace: String, events: usize },
    /// The scan failed; it is logged and implicitly retried next cycle.
    Failed {
        namespace: String,
        error: OomWatchError,
    },
}

impl ScanOutcome {
    pub fn namespace(&self) -> &str {
        match self {
            ScanOutcome::Completed { namespace, .. } => namespace,
            ScanOutcome::Failed { namespace, .. } => namespace,
        }
    }
}

/// Drives the scan cycle: list namespaces, fan out one scan task per
/// namespace, log every outcome, sleep, repeat.
pub struct Orchestrator {
    context: ScanContext,
    namespaces: Arc<dyn NamespaceLister>,
    pods: Arc<dyn PodFetcher>,
    metrics: Arc<dyn MetricEmitter>,
    interval: Duration,
}

impl Orchestrator {
    pub fn new(
        context: ScanContext,
        namespaces: Arc<dyn NamespaceLister>,
        pods: Arc<dyn PodFetcher>,
        metrics: Arc<dyn MetricEmitter>,
        interval: Duration,
    ) -> Self {
        Self {
            context,
            namespaces,
            pods,
            metrics,
            interval,
        }
    }

    /// Run scan cycles until the process is terminated.
    ///
    /// Only per-namespace scan errors are absorbed; a failure to list
    /// namespaces ends the loop and with it the process.
    pub async fn run(&self) -> Result<()> {
        loop {
            let outcomes = self.run_cycle().await?;

            for outcome in &outcomes {
                match outcome {
                    ScanOutcome::Completed { namespace, events } => {
                        info!(namespace = %namespace, events, "scan completed");
                    }
                    ScanOutcome::Failed { namespace, error } => {
                        warn!(namespace = %namespace, error = %error, "scan failed");
                    }
                }
            }

            info!(namespaces = outcomes.len(), "cycle completed");
            tokio::time::sleep(self.interval).await;
        }
    }

    /// One full cycle: list namespaces and scan them all concurrently.
    ///
    /// Every namespace yields an outcome; a failing scan never cancels its
    /// siblings.
    pub async fn run_cycle(&self) -> Result<Vec<ScanOutcome>> {
        let namespaces = self.namespaces.list_namespaces().await?;
        info!(namespaces = namespaces.len(), "starting scan cycle");

        let mut tasks = JoinSet::new();
        for namespace in namespaces {
            let pods = Arc::clone(&self.pods);
            let metrics = Arc::clone(&self.metrics);
            let context = self.context.clone();

            tasks.spawn(async move {
                match scan_namespace(&context, pods.as_ref(), metrics.as_ref(), &namespace).await {
                    Ok(events) => ScanOutcome::Completed { namespace, events },
                    Err(error) => ScanOutcome::Failed { namespace, error },
                }
            });
        }

        let mut outcomes = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                // A panicked task loses its namespace attribution but must
                // not take the rest of the cycle down with it.
                Err(join_error) => error!(error = %join_error, "scan task panicked"),
            }
        }

        Ok(outcomes)
    }
}

/// Scan a single namespace: fetch pod statuses, classify, emit one metric
/// point per OOM-killed pod.
async fn scan_namespace(
    context: &ScanContext,
    pods: &dyn PodFetcher,
    metrics: &dyn MetricEmitter,
    namespace: &str,
) -> Result<usize> {
    let pod_list = pods.fetch_pods(namespace).await?;
    let events = oom::detect_oom_kills(namespace, &pod_list);

    for event in &events {
        info!(namespace = %event.namespace, pod = %event.pod_name, "reporting OOM kill");
        metrics.emit(context, event).await?;
    }

    Ok(events.len())
}
