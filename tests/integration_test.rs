use k8s_openapi::api::core::v1::{
    ContainerState, ContainerStateTerminated, ContainerStatus, Pod, PodStatus,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use oomwatch::error::OomWatchError;
use oomwatch::k8s::{detect_oom_kills, OomEvent};

#[test]
fn test_fetch_error_carries_status_and_body() {
    let err = OomWatchError::ApiServerStatus {
        status: 403,
        body: "forbidden".to_string(),
    };

    assert!(err.to_string().contains("403"));
    assert!(err.to_string().contains("forbidden"));
}

#[test]
fn test_version_const() {
    assert!(!oomwatch::VERSION.is_empty());
}

#[test]
fn test_classifier_public_surface() {
    let pod = Pod {
        metadata: ObjectMeta {
            name: Some("app-1".to_string()),
            ..Default::default()
        },
        status: Some(PodStatus {
            container_statuses: Some(vec![ContainerStatus {
                name: "main".to_string(),
                last_state: Some(ContainerState {
                    terminated: Some(ContainerStateTerminated {
                        exit_code: 137,
                        reason: Some("OOMKilled".to_string()),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    };

    let events = detect_oom_kills("prod", &[pod]);

    assert_eq!(
        events,
        vec![OomEvent {
            namespace: "prod".to_string(),
            pod_name: "app-1".to_string(),
        }]
    );
}
