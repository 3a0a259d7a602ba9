use thiserror::Error;

#[derive(Error, Debug)]
pub enum OomWatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Metadata lookup for {path} failed with HTTP {status}")]
    Metadata { path: String, status: u16 },

    #[error("Kubernetes error: {0}")]
    Kubernetes(#[from] kube::Error),

    #[error("Pod fetch failed: {status}/{body}")]
    ApiServerStatus { status: u16, body: String },

    #[error("Metric push failed: {status}/{body}")]
    MonitoringStatus { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, OomWatchError>;
