// ABOUTME: Container engine gateway: capability traits, bollard adapter, detection.
// ABOUTME: The orchestrator sees only the traits; bollard is the sole implementation.

mod bollard;
mod detection;
mod error;
pub(crate) mod traits;
mod types;

pub use bollard::BollardGateway;
pub use detection::{DetectionError, detect_local};
pub use error::{RuntimeError, RuntimeErrorKind};
pub use traits::*;
pub use types::{DetectedRuntime, RuntimeConfig, RuntimeType};
