pub mod client;
pub mod directory;
pub mod types;

pub use client::K8sClient;
pub use directory::{KubePodDirectory, PodDirectory};
pub use types::{effective_phase, LabelSelector, Phase, PodRecord};
