//! Runtime settings for a podset invocation
//!
//! Settings are read once from the environment, optionally overridden from the
//! command line, and then handed to the client and the poller. Nothing here is
//! global.

use crate::{PodSetError, Result};
use std::env;
use std::time::Duration;

pub const NAMESPACE_ENV: &str = "NAMESPACE";
pub const KUBE_SERVICE_HOST_ENV: &str = "KUBERNETES_SERVICE_HOST";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How the Kubernetes client obtains credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Service account mounted into the pod
    InCluster,
    /// Local kubeconfig, optionally pinned to a named context
    Kubeconfig { context: Option<String> },
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub namespace: String,
    pub credentials: CredentialSource,
    pub poll_interval: Duration,
    pub timeout: Option<Duration>,
}

impl Settings {
    /// Build settings from the process environment.
    ///
    /// `NAMESPACE` is required. The presence of `KUBERNETES_SERVICE_HOST`
    /// selects in-cluster credentials.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let namespace = lookup(NAMESPACE_ENV)
            .filter(|ns| !ns.is_empty())
            .ok_or_else(|| {
                PodSetError::ConfigError(format!("{} is not set", NAMESPACE_ENV))
            })?;

        let credentials = if lookup(KUBE_SERVICE_HOST_ENV).is_some() {
            CredentialSource::InCluster
        } else {
            CredentialSource::Kubeconfig { context: None }
        };

        Ok(Self {
            namespace,
            credentials,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        })
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.credentials = CredentialSource::Kubeconfig {
            context: Some(context.into()),
        };
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_missing_namespace_is_config_error() {
        let err = Settings::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, PodSetError::ConfigError(_)));
        assert!(err.to_string().contains("NAMESPACE"));
    }

    #[test]
    fn test_empty_namespace_is_config_error() {
        let err = Settings::from_lookup(lookup(&[("NAMESPACE", "")])).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_service_host_selects_in_cluster() {
        let settings = Settings::from_lookup(lookup(&[
            ("NAMESPACE", "training"),
            ("KUBERNETES_SERVICE_HOST", "10.96.0.1"),
        ]))
        .unwrap();

        assert_eq!(settings.namespace, "training");
        assert_eq!(settings.credentials, CredentialSource::InCluster);
        assert_eq!(settings.poll_interval, DEFAULT_POLL_INTERVAL);
        assert!(settings.timeout.is_none());
    }

    #[test]
    fn test_kubeconfig_without_service_host() {
        let settings = Settings::from_lookup(lookup(&[("NAMESPACE", "default")]))
            .unwrap()
            .with_context("kind-dev");

        assert_eq!(
            settings.credentials,
            CredentialSource::Kubeconfig {
                context: Some("kind-dev".to_string())
            }
        );
    }
}
