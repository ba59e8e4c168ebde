//! Normalized images and their size metadata.

use image::RgbImage;
use serde::{Deserialize, Serialize};

/// Size and dimension metadata for a normalized upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// Byte length of the uploaded source.
    pub original_size_bytes: u64,
    /// Byte length of the re-encoded processed image.
    pub processed_size_bytes: u64,
    /// Source `[width, height]`.
    pub original_dimensions: [u32; 2],
    /// Processed `[width, height]`.
    pub processed_dimensions: [u32; 2],
}

/// Flat 8-bit RGB image bounded to the normalizer limits, with its encoded
/// form and metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedImage {
    pixels: RgbImage,
    encoded: Vec<u8>,
    metadata: ImageMetadata,
}

impl NormalizedImage {
    /// Assembles a normalized image from its parts.
    #[must_use]
    pub const fn new(pixels: RgbImage, encoded: Vec<u8>, metadata: ImageMetadata) -> Self {
        Self {
            pixels,
            encoded,
            metadata,
        }
    }

    /// Returns the decoded pixels handed to the models.
    #[must_use]
    pub const fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    /// Returns the re-encoded bytes persisted as the processed artifact.
    #[must_use]
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    /// Returns the size metadata.
    #[must_use]
    pub const fn metadata(&self) -> ImageMetadata {
        self.metadata
    }
}
