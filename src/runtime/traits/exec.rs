// ABOUTME: Exec operations trait for the engine gateway.
// ABOUTME: Execute readiness-probe commands inside running containers.

use super::sealed::Sealed;
use super::shared_types::{ExecConfig, ExecResult};
use async_trait::async_trait;

/// Exec operations: run commands in containers by name.
#[async_trait]
pub trait ExecOps: Sealed + Send + Sync {
    /// Create and run an exec instance, returning exit code and output.
    async fn exec(&self, container: &str, config: &ExecConfig) -> Result<ExecResult, ExecError>;
}

/// Errors from exec operations.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    #[error("container not running: {0}")]
    ContainerNotRunning(String),

    #[error("exec failed: {0}")]
    Failed(String),

    #[error("engine error: {0}")]
    Engine(String),
}
