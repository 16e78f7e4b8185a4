use crate::config::{CredentialSource, Settings};
use crate::k8s::types::LabelSelector;
use crate::{PodSetError, Result};
use k8s_openapi::api::core::v1::Pod;
use kube::api::ListParams;
use kube::config::KubeConfigOptions;
use kube::{Api, Client, Config};
use tracing::{debug, info};

pub struct K8sClient {
    client: Client,
}

impl K8sClient {
    /// Build a client from the credential source named in `settings`.
    pub async fn from_settings(settings: &Settings) -> Result<Self> {
        debug!("Initializing Kubernetes client");

        let config = match &settings.credentials {
            CredentialSource::InCluster => Config::incluster().map_err(|e| {
                PodSetError::ConfigError(format!("Failed to load in-cluster config: {}", e))
            })?,
            CredentialSource::Kubeconfig { context } => {
                let options = KubeConfigOptions {
                    context: context.clone(),
                    ..Default::default()
                };
                Config::from_kubeconfig(&options).await.map_err(|e| {
                    PodSetError::ConfigError(format!("Failed to load kubeconfig: {}", e))
                })?
            }
        };

        let client = Client::try_from(config).map_err(|e| {
            PodSetError::ConfigError(format!("Failed to create K8s client: {}", e))
        })?;

        info!("Kubernetes client ready");

        Ok(Self { client })
    }

    pub fn pods(&self, namespace: &str) -> Api<Pod> {
        Api::namespaced(self.client.clone(), namespace)
    }

    pub async fn list_pods(&self, namespace: &str, selector: &LabelSelector) -> Result<Vec<Pod>> {
        let lp = ListParams::default().labels(selector.as_str());

        let pod_list = self.pods(namespace).list(&lp).await.map_err(|e| {
            PodSetError::KubernetesError(format!(
                "Failed to list pods in {} matching {}: {}",
                namespace, selector, e
            ))
        })?;

        Ok(pod_list.items)
    }
}
