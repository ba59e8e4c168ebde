//! Filesystem image store rooted at the upload directory.
//!
//! All access goes through a capability handle on the root directory, so
//! image references cannot escape it.

use async_trait::async_trait;
use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use std::io::ErrorKind;
use std::sync::Arc;

use crate::task::{
    domain::ImageRef,
    ports::{ImageStore, ImageStoreError, ImageStoreResult},
};

/// Image store reading and writing files below one root directory.
#[derive(Debug, Clone)]
pub struct FilesystemImageStore {
    root: Arc<Dir>,
}

impl FilesystemImageStore {
    /// Opens a store rooted at an existing directory.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error when the directory cannot be opened.
    pub fn open(root: &Utf8Path) -> std::io::Result<Self> {
        let dir = Dir::open_ambient_dir(root, ambient_authority())?;
        Ok(Self::from_dir(dir))
    }

    /// Wraps an already opened directory handle.
    #[must_use]
    pub fn from_dir(dir: Dir) -> Self {
        Self {
            root: Arc::new(dir),
        }
    }
}

fn join_error(err: tokio::task::JoinError) -> ImageStoreError {
    ImageStoreError::io(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl ImageStore for FilesystemImageStore {
    async fn read(&self, image_ref: &ImageRef) -> ImageStoreResult<Vec<u8>> {
        let root = Arc::clone(&self.root);
        let path = image_ref.as_str().to_owned();
        let result = tokio::task::spawn_blocking(move || root.read(path))
            .await
            .map_err(join_error)?;
        match result {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(ImageStoreError::NotFound(image_ref.clone()))
            }
            Err(err) => Err(ImageStoreError::io(err)),
        }
    }

    async fn write(&self, image_ref: &ImageRef, bytes: &[u8]) -> ImageStoreResult<()> {
        let root = Arc::clone(&self.root);
        let path = image_ref.as_str().to_owned();
        let bytes = bytes.to_vec();
        tokio::task::spawn_blocking(move || {
            if let Some(parent) = Utf8Path::new(&path).parent()
                && !parent.as_str().is_empty()
            {
                root.create_dir_all(parent)?;
            }
            root.write(&path, bytes)
        })
        .await
        .map_err(join_error)?
        .map_err(ImageStoreError::io)
    }
}
