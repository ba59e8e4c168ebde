//! Shared helpers for analysis tests.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// Tolerance for floating-point score comparisons.
pub const EPSILON: f64 = 1e-9;

/// Encodes a solid-colour image in the given format.
pub fn encoded_image(image: DynamicImage, format: ImageFormat) -> eyre::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), format)?;
    Ok(bytes)
}

/// Encodes a solid green PNG of the given size.
pub fn green_png(width: u32, height: u32) -> eyre::Result<Vec<u8>> {
    let pixels = RgbImage::from_pixel(width, height, Rgb([34, 139, 34]));
    encoded_image(DynamicImage::ImageRgb8(pixels), ImageFormat::Png)
}

pub fn approx_eq(left: f64, right: f64) -> bool {
    (left - right).abs() < EPSILON
}
