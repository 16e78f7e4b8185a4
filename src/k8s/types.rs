use k8s_openapi::api::core::v1::Pod;
use serde::Serialize;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Effective lifecycle phase of a pod.
///
/// The standard Kubernetes phases plus a synthetic `Terminating` for pods that
/// carry a deletion timestamp. Phases the API reports that are not known here
/// pass through verbatim as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub enum Phase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
    Terminating,
    Other(String),
}

impl Phase {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "Pending",
            Self::Running => "Running",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Unknown => "Unknown",
            Self::Terminating => "Terminating",
            Self::Other(s) => s,
        }
    }
}

impl From<&str> for Phase {
    fn from(s: &str) -> Self {
        match s {
            "Pending" => Self::Pending,
            "Running" => Self::Running,
            "Succeeded" => Self::Succeeded,
            "Failed" => Self::Failed,
            "Unknown" => Self::Unknown,
            "Terminating" => Self::Terminating,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<Phase> for String {
    fn from(phase: Phase) -> Self {
        phase.as_str().to_string()
    }
}

impl FromStr for Phase {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label selector passed through unmodified to the pod listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSelector(String);

impl LabelSelector {
    pub fn new(selector: impl Into<String>) -> Self {
        Self(selector.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for LabelSelector {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for LabelSelector {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Phase used for every derived view: `Terminating` once a deletion timestamp
/// is set, otherwise the phase the API reports.
pub fn effective_phase(pod: &Pod) -> Phase {
    if pod.metadata.deletion_timestamp.is_some() {
        return Phase::Terminating;
    }

    pod.status
        .as_ref()
        .and_then(|s| s.phase.as_deref())
        .map(Phase::from)
        .unwrap_or(Phase::Unknown)
}

/// Typed view of one pod, rebuilt on every query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodRecord {
    pub phase: Phase,
    pub ip: Option<String>,
    pub containers_ready: Vec<bool>,
}

impl PodRecord {
    pub fn from_k8s_pod(pod: &Pod) -> Self {
        let status = pod.status.as_ref();

        let containers_ready = status
            .and_then(|s| s.container_statuses.as_ref())
            .map(|statuses| statuses.iter().map(|cs| cs.ready).collect())
            .unwrap_or_default();

        Self {
            phase: effective_phase(pod),
            ip: status
                .and_then(|s| s.pod_ip.clone())
                .filter(|ip| !ip.is_empty()),
            containers_ready,
        }
    }

    /// True when the pod reports at least one container and all of them are
    /// ready. A pod without container statuses is not ready yet.
    pub fn all_containers_ready(&self) -> bool {
        !self.containers_ready.is_empty() && self.containers_ready.iter().all(|ready| *ready)
    }
}
