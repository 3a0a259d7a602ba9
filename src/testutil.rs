//! Shared fixtures for unit tests: a minimal HTTP stub server and pod
//! status builders.

use k8s_openapi::api::core::v1::{
    ContainerState, ContainerStateTerminated, ContainerStatus, Pod, PodStatus,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// Spawn a one-socket HTTP responder. `route` maps a request path to a
/// status code and body; every received request is forwarded on the
/// returned channel for assertions.
pub async fn spawn_stub<F>(route: F) -> (String, mpsc::Receiver<String>)
where
    F: Fn(&str) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("stub should bind");
    let addr = listener.local_addr().expect("stub should have an address");
    let (tx, rx) = mpsc::channel(16);

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };

            let request = read_request(&mut socket).await;
            let path = request
                .lines()
                .next()
                .and_then(|line| line.split_whitespace().nth(1))
                .unwrap_or("/")
                .to_string();
            let _ = tx.send(request).await;

            let (status, body) = route(&path);
            let response = format!(
                "HTTP/1.1 {status} Stub\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
        }
    });

    (format!("http://{addr}"), rx)
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|window| window == b"\r\n\r\n") {
                    break;
                }
            }
        }
    }

    String::from_utf8_lossy(&buf).to_string()
}

/// A pod whose first container terminated with the given reason.
pub fn pod_with_last_reason(name: &str, reason: &str) -> Pod {
    pod_with_statuses(
        name,
        vec![container_status_with_reason("main", Some(reason))],
    )
}

/// A pod with the given container statuses.
pub fn pod_with_statuses(name: &str, statuses: Vec<ContainerStatus>) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            ..Default::default()
        },
        status: Some(PodStatus {
            container_statuses: Some(statuses),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// A container status whose last termination carries the given reason,
/// or no last state at all when `reason` is `None`.
pub fn container_status_with_reason(container: &str, reason: Option<&str>) -> ContainerStatus {
    ContainerStatus {
        name: container.to_string(),
        last_state: reason.map(|reason| ContainerState {
            terminated: Some(ContainerStateTerminated {
                exit_code: 137,
                reason: Some(reason.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}
