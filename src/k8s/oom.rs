//! OOM-kill classification over fetched pod statuses.

use k8s_openapi::api::core::v1::Pod;

/// Termination reason set by the container runtime when the kernel's
/// out-of-memory handler killed the container.
const OOM_KILLED: &str = "OOMKilled";

/// A pod whose most recent container termination was an OOM kill, found
/// during the current scan cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OomEvent {
    pub namespace: String,
    pub pod_name: String,
}

/// Classify one namespace's pods, returning an event per OOM-killed pod.
///
/// Only the first container status is examined. This matches the
/// single-container deployments the metric was built for; an OOM kill in a
/// later container of a multi-container pod is not detected. Pods without
/// container statuses, without a last state, or whose last termination
/// carries a different reason produce no event.
pub fn detect_oom_kills(namespace: &str, pods: &[Pod]) -> Vec<OomEvent> {
    pods.iter()
        .filter(|pod| is_oom_killed(pod))
        .filter_map(|pod| pod.metadata.name.as_deref())
        .map(|pod_name| OomEvent {
            namespace: namespace.to_string(),
            pod_name: pod_name.to_string(),
        })
        .collect()
}

fn is_oom_killed(pod: &Pod) -> bool {
    pod.status
        .as_ref()
        .and_then(|status| status.container_statuses.as_ref())
        .and_then(|statuses| statuses.first())
        .and_then(|container| container.last_state.as_ref())
        .and_then(|last_state| last_state.terminated.as_ref())
        .and_then(|terminated| terminated.reason.as_deref())
        == Some(OOM_KILLED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{container_status_with_reason, pod_with_last_reason, pod_with_statuses};
    use k8s_openapi::api::core::v1::{ContainerState, ContainerStatus};

    #[test]
    fn test_no_container_statuses_yields_no_event() {
        let pod = pod_with_statuses("app-1", vec![]);
        assert!(detect_oom_kills("default", &[pod]).is_empty());
    }

    #[test]
    fn test_missing_status_yields_no_event() {
        let pod = Pod::default();
        assert!(detect_oom_kills("default", &[pod]).is_empty());
    }

    #[test]
    fn test_oom_killed_first_container_yields_one_event() {
        let pod = pod_with_last_reason("app-1", "OOMKilled");
        let events = detect_oom_kills("prod", &[pod]);

        assert_eq!(
            events,
            vec![OomEvent {
                namespace: "prod".to_string(),
                pod_name: "app-1".to_string(),
            }]
        );
    }

    #[test]
    fn test_other_termination_reason_yields_no_event() {
        let pod = pod_with_last_reason("batch-1", "Completed");
        assert!(detect_oom_kills("default", &[pod]).is_empty());
    }

    #[test]
    fn test_absent_last_state_yields_no_event() {
        let pod = pod_with_statuses(
            "app-1",
            vec![container_status_with_reason("main", None)],
        );
        assert!(detect_oom_kills("default", &[pod]).is_empty());
    }

    #[test]
    fn test_empty_last_state_yields_no_event() {
        let status = ContainerStatus {
            name: "main".to_string(),
            last_state: Some(ContainerState::default()),
            ..Default::default()
        };
        let pod = pod_with_statuses("app-1", vec![status]);

        assert!(detect_oom_kills("default", &[pod]).is_empty());
    }

    #[test]
    fn test_only_first_container_status_is_examined() {
        let pod = pod_with_statuses(
            "app-1",
            vec![
                container_status_with_reason("main", Some("Completed")),
                container_status_with_reason("sidecar", Some("OOMKilled")),
            ],
        );

        assert!(detect_oom_kills("default", &[pod]).is_empty());
    }

    #[test]
    fn test_first_container_oom_with_extra_containers_yields_one_event() {
        let pod = pod_with_statuses(
            "app-1",
            vec![
                container_status_with_reason("main", Some("OOMKilled")),
                container_status_with_reason("sidecar", Some("OOMKilled")),
            ],
        );

        assert_eq!(detect_oom_kills("default", &[pod]).len(), 1);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let pods = vec![
            pod_with_last_reason("app-1", "OOMKilled"),
            pod_with_last_reason("app-2", "Completed"),
        ];

        let first = detect_oom_kills("prod", &pods);
        let second = detect_oom_kills("prod", &pods);

        assert_eq!(first, second);
    }
}
