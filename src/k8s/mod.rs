pub mod client;
pub mod fetcher;
pub mod oom;

pub use client::{K8sClient, NamespaceLister};
pub use fetcher::{ApiServerFetcher, PodFetcher};
pub use oom::{detect_oom_kills, OomEvent};
