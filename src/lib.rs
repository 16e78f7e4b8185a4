pub mod cli;
pub mod config;
pub mod error;
pub mod k8s;
pub mod net;
pub mod view;
pub mod wait;

pub use config::Settings;
pub use error::{PodSetError, Result};
pub use view::PodSetView;
pub use wait::{Pending, Poller, WaitOutcome};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
