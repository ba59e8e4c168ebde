//! In-memory image store for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::ImageRef,
    ports::{ImageStore, ImageStoreError, ImageStoreResult},
};

/// Thread-safe image store keeping bytes in a map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryImageStore {
    images: Arc<RwLock<HashMap<ImageRef, Vec<u8>>>>,
}

impl InMemoryImageStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when bytes are stored under `image_ref`.
    ///
    /// A poisoned lock reads as absent.
    #[must_use]
    pub fn contains(&self, image_ref: &ImageRef) -> bool {
        self.images
            .read()
            .is_ok_and(|images| images.contains_key(image_ref))
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn read(&self, image_ref: &ImageRef) -> ImageStoreResult<Vec<u8>> {
        let images = self
            .images
            .read()
            .map_err(|err| ImageStoreError::io(std::io::Error::other(err.to_string())))?;
        images
            .get(image_ref)
            .cloned()
            .ok_or_else(|| ImageStoreError::NotFound(image_ref.clone()))
    }

    async fn write(&self, image_ref: &ImageRef, bytes: &[u8]) -> ImageStoreResult<()> {
        let mut images = self
            .images
            .write()
            .map_err(|err| ImageStoreError::io(std::io::Error::other(err.to_string())))?;
        images.insert(image_ref.clone(), bytes.to_vec());
        Ok(())
    }
}
