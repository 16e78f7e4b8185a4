//! Pod directory: the single external collaborator every view reads from

use crate::k8s::client::K8sClient;
use crate::k8s::types::LabelSelector;
use crate::Result;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use tracing::debug;

/// Lists the pods of one namespace that match a label selector.
#[async_trait]
pub trait PodDirectory: Send + Sync {
    async fn list(&self, selector: &LabelSelector) -> Result<Vec<Pod>>;
}

/// Pod directory backed by the Kubernetes API
pub struct KubePodDirectory {
    client: K8sClient,
    namespace: String,
}

impl KubePodDirectory {
    pub fn new(client: K8sClient, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }
}

#[async_trait]
impl PodDirectory for KubePodDirectory {
    async fn list(&self, selector: &LabelSelector) -> Result<Vec<Pod>> {
        let pods = self.client.list_pods(&self.namespace, selector).await?;
        debug!(
            "Listed {} pods in {} matching {}",
            pods.len(),
            self.namespace,
            selector
        );
        Ok(pods)
    }
}
