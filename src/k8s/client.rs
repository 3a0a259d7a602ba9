use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;
use kube::{Api, Client, ResourceExt};
use tracing::debug;

use crate::error::Result;

/// Source of the current namespace set, queried fresh every scan cycle so
/// namespaces created or deleted mid-run are picked up next cycle.
#[async_trait]
pub trait NamespaceLister: Send + Sync {
    async fn list_namespaces(&self) -> Result<Vec<String>>;
}

/// Namespace listing through the standard in-cluster Kubernetes client.
pub struct K8sClient {
    client: Client,
}

impl K8sClient {
    pub async fn try_default() -> Result<Self> {
        debug!("Initializing Kubernetes client");
        let client = Client::try_default().await?;
        Ok(Self { client })
    }
}

#[async_trait]
impl NamespaceLister for K8sClient {
    async fn list_namespaces(&self) -> Result<Vec<String>> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        let list = namespaces.list(&Default::default()).await?;

        Ok(list.items.iter().map(|ns| ns.name_any()).collect())
    }
}
