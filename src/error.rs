use crate::wait::WaitOutcome;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PodSetError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Kubernetes error: {0}")]
    KubernetesError(String),

    #[error("Failed to resolve local address: {0}")]
    LocalAddress(String),

    #[error("Local pod not found among pods matching {selector}")]
    LocalPodNotFound { selector: String },

    #[error("Output error: {0}")]
    OutputError(String),

    #[error("Wait ended without success: {0}")]
    WaitIncomplete(WaitOutcome),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl PodSetError {
    /// Whether retrying the same call can never succeed.
    ///
    /// Configuration problems are fatal; a failed query or an unresolved
    /// local address may clear up on a later attempt.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ConfigError(_) | Self::OutputError(_))
    }
}

pub type Result<T> = std::result::Result<T, PodSetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_fatal() {
        assert!(PodSetError::ConfigError("NAMESPACE is not set".to_string()).is_fatal());
        assert!(!PodSetError::KubernetesError("connection refused".to_string()).is_fatal());
        assert!(!PodSetError::LocalAddress("no address".to_string()).is_fatal());
    }

    #[test]
    fn test_wait_incomplete_message() {
        let err = PodSetError::WaitIncomplete(WaitOutcome::TimedOut);
        assert_eq!(err.to_string(), "Wait ended without success: timed out");
    }
}
