// ABOUTME: Image operations trait for the engine gateway.
// ABOUTME: Pull images and check local availability.

use super::sealed::Sealed;
use super::shared_types::ImageSummary;
use crate::types::ImageRef;
use async_trait::async_trait;

/// Image operations: pull and local availability.
#[async_trait]
pub trait ImageOps: Sealed + Send + Sync {
    /// Pull an image from its registry. Long-running; consumes the whole
    /// progress stream before returning.
    async fn pull_image(&self, reference: &ImageRef) -> Result<(), ImageError>;

    /// Check if an image exists locally.
    async fn image_exists(&self, reference: &ImageRef) -> Result<bool, ImageError>;

    /// List local images matching any of the given references.
    async fn list_images(&self, references: &[ImageRef]) -> Result<Vec<ImageSummary>, ImageError>;
}

/// Errors from image operations.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("pull failed: {0}")]
    PullFailed(String),

    #[error("engine error: {0}")]
    Engine(String),
}
