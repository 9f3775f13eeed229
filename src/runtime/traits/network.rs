// ABOUTME: Network operations trait for the engine gateway.
// ABOUTME: Inspect-or-create semantics for the stack's private network.

use super::sealed::Sealed;
use super::shared_types::NetworkConfig;
use crate::types::NetworkId;
use async_trait::async_trait;

/// Network operations.
#[async_trait]
pub trait NetworkOps: Sealed + Send + Sync {
    /// Ensure a network with the given name exists, creating it if needed.
    ///
    /// Must tolerate the race where another actor creates the network between
    /// the existence check and the create call.
    async fn ensure_network(&self, config: &NetworkConfig) -> Result<NetworkId, NetworkError>;

    /// Check if a network exists.
    async fn network_exists(&self, name: &str) -> Result<bool, NetworkError>;
}

/// Errors from network operations.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("network not found: {0}")]
    NotFound(String),

    #[error("network already exists: {0}")]
    AlreadyExists(String),

    #[error("engine error: {0}")]
    Engine(String),
}
