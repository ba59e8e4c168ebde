//! Decoding, colour flattening, bounded downsampling, and re-encoding of
//! uploaded images.

use crate::analysis::domain::{ImageMetadata, NormalizedImage};
use image::{
    ExtendedColorType, ImageEncoder, ImageError, RgbImage,
    codecs::jpeg::JpegEncoder,
    imageops::{self, FilterType},
};
use thiserror::Error;
use tracing::debug;

/// Limits applied by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizerConfig {
    /// Largest processed width in pixels.
    pub max_width: u32,
    /// Largest processed height in pixels.
    pub max_height: u32,
    /// JPEG quality of the processed artifact (1-100).
    pub jpeg_quality: u8,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            max_width: 800,
            max_height: 600,
            jpeg_quality: 85,
        }
    }
}

/// Errors raised while normalizing an upload.
#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The source bytes are not a decodable image.
    #[error("source is not a decodable image: {0}")]
    Decode(#[source] ImageError),

    /// The processed image could not be encoded.
    #[error("failed to encode processed image: {0}")]
    Encode(#[source] ImageError),
}

/// Turns raw uploads into bounded RGB images.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageNormalizer {
    config: NormalizerConfig,
}

impl ImageNormalizer {
    /// Creates a normalizer with the given limits.
    #[must_use]
    pub const fn new(config: NormalizerConfig) -> Self {
        Self { config }
    }

    /// Normalizes raw image bytes.
    ///
    /// Alpha, palette, greyscale and 16-bit inputs are flattened to 8-bit
    /// RGB. Images larger than the bound are shrunk to fit, keeping aspect
    /// ratio; smaller images are left at their size.
    ///
    /// # Errors
    ///
    /// Returns [`NormalizeError::Decode`] when the bytes are not an image and
    /// [`NormalizeError::Encode`] if re-encoding fails.
    pub fn normalize(&self, raw: &[u8]) -> Result<NormalizedImage, NormalizeError> {
        let decoded = image::load_from_memory(raw).map_err(NormalizeError::Decode)?;
        let original_dimensions = [decoded.width(), decoded.height()];
        let rgb = decoded.to_rgb8();

        let (target_width, target_height) = self.fit_within(rgb.width(), rgb.height());
        let pixels = if (target_width, target_height) == rgb.dimensions() {
            rgb
        } else {
            imageops::resize(&rgb, target_width, target_height, FilterType::Lanczos3)
        };

        let encoded = self.encode(&pixels)?;
        let metadata = ImageMetadata {
            original_size_bytes: raw.len() as u64,
            processed_size_bytes: encoded.len() as u64,
            original_dimensions,
            processed_dimensions: [pixels.width(), pixels.height()],
        };
        debug!(
            original = ?metadata.original_dimensions,
            processed = ?metadata.processed_dimensions,
            "normalized image"
        );
        Ok(NormalizedImage::new(pixels, encoded, metadata))
    }

    /// Computes the largest size within the bound that keeps aspect ratio.
    /// Never grows an image.
    fn fit_within(&self, width: u32, height: u32) -> (u32, u32) {
        let NormalizerConfig {
            max_width,
            max_height,
            ..
        } = self.config;
        if width <= max_width && height <= max_height {
            return (width, height);
        }
        let scale = (f64::from(max_width) / f64::from(width))
            .min(f64::from(max_height) / f64::from(height));
        let scaled = |side: u32| -> u32 {
            let value = (f64::from(side) * scale).round();
            // Bounded by the original side, which already fits in u32.
            (value as u32).max(1)
        };
        (
            scaled(width).min(max_width),
            scaled(height).min(max_height),
        )
    }

    fn encode(&self, pixels: &RgbImage) -> Result<Vec<u8>, NormalizeError> {
        let mut encoded = Vec::new();
        let encoder = JpegEncoder::new_with_quality(&mut encoded, self.config.jpeg_quality);
        encoder
            .write_image(
                pixels.as_raw(),
                pixels.width(),
                pixels.height(),
                ExtendedColorType::Rgb8,
            )
            .map_err(NormalizeError::Encode)?;
        Ok(encoded)
    }
}
