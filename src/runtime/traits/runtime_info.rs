// ABOUTME: Engine info trait for the gateway.
// ABOUTME: Query engine version, memory, and architecture for preflight.

use super::sealed::Sealed;
use super::shared_types::EngineMetadata;
use async_trait::async_trait;

/// Engine metadata operations.
#[async_trait]
pub trait RuntimeInfo: Sealed + Send + Sync {
    /// Get engine version, total memory, and architecture.
    async fn info(&self) -> Result<EngineMetadata, RuntimeInfoError>;

    /// Ping the engine to check connectivity.
    async fn ping(&self) -> Result<(), RuntimeInfoError>;
}

/// Errors from engine info operations.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeInfoError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("engine error: {0}")]
    Engine(String),
}
