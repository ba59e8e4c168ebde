//! Image store port for source and processed image bytes.

use crate::task::domain::ImageRef;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for image store operations.
pub type ImageStoreResult<T> = Result<T, ImageStoreError>;

/// Byte storage addressed by relative image references.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Reads the bytes stored under `image_ref`.
    ///
    /// # Errors
    ///
    /// Returns [`ImageStoreError::NotFound`] when nothing is stored under the
    /// reference, or [`ImageStoreError::Io`] when the read fails.
    async fn read(&self, image_ref: &ImageRef) -> ImageStoreResult<Vec<u8>>;

    /// Writes `bytes` under `image_ref`, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns [`ImageStoreError::Io`] when the write fails.
    async fn write(&self, image_ref: &ImageRef, bytes: &[u8]) -> ImageStoreResult<()>;
}

/// Errors returned by image store implementations.
#[derive(Debug, Clone, Error)]
pub enum ImageStoreError {
    /// No image is stored under the reference.
    #[error("image not found: {0}")]
    NotFound(ImageRef),

    /// Storage-layer failure.
    #[error("image store I/O error: {0}")]
    Io(Arc<dyn std::error::Error + Send + Sync>),
}

impl ImageStoreError {
    /// Wraps a storage error.
    pub fn io(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Io(Arc::new(err))
    }
}
