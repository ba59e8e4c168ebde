//! Primary-instance selection and mask isolation.

use crate::analysis::domain::{Instance, MaskPolygon};
use image::{GrayImage, Luma, Rgba, RgbaImage, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;

const FILLED: Luma<u8> = Luma([u8::MAX]);

/// Picks the instance that becomes the task's primary subject.
///
/// Highest confidence wins; ties go to the earliest detection. Non-finite
/// confidences count as zero.
#[must_use]
pub fn select_primary(instances: &[Instance]) -> Option<usize> {
    let rank = |confidence: f64| if confidence.is_finite() { confidence } else { 0.0 };
    instances
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (index, instance)| {
            let score = rank(instance.confidence);
            match best {
                Some((_, best_score)) if best_score >= score => best,
                _ => Some((index, score)),
            }
        })
        .map(|(index, _)| index)
}

/// Cuts one instance out of the image.
///
/// The result is cropped to the mask's extent, clipped to the image. The
/// mask outline is rasterized filled, boundary pixels included, and every
/// pixel it does not cover is fully transparent. Returns `None` when the
/// mask covers no pixel of the image.
#[must_use]
pub fn isolate_instance(image: &RgbImage, mask: &MaskPolygon) -> Option<RgbaImage> {
    let (min_x, min_y, max_x, max_y) = mask.extent()?;
    let (width, height) = image.dimensions();

    let left = clip(min_x.floor(), width);
    let top = clip(min_y.floor(), height);
    let right = clip(max_x.ceil(), width);
    let bottom = clip(max_y.ceil(), height);
    if right <= left || bottom <= top {
        return None;
    }

    let coverage = rasterize(mask, left, top, right - left, bottom - top);
    if coverage.pixels().all(|pixel| pixel.0[0] == 0) {
        return None;
    }

    Some(RgbaImage::from_fn(right - left, bottom - top, |cx, cy| {
        if coverage.get_pixel(cx, cy).0[0] == 0 {
            return Rgba([0, 0, 0, 0]);
        }
        let [r, g, b] = image.get_pixel(left + cx, top + cy).0;
        Rgba([r, g, b, u8::MAX])
    }))
}

/// Draws the filled mask into a canvas whose origin is `(left, top)`.
fn rasterize(mask: &MaskPolygon, left: u32, top: u32, width: u32, height: u32) -> GrayImage {
    let mut canvas = GrayImage::new(width, height);
    let mut outline: Vec<Point<i32>> = mask
        .points()
        .iter()
        .map(|point| {
            Point::new(
                (point.x - left as f32).round() as i32,
                (point.y - top as f32).round() as i32,
            )
        })
        .collect();
    outline.dedup();
    // The outline is implicitly closed; an explicit closing vertex is dropped.
    while outline.len() > 1 && outline.first() == outline.last() {
        outline.pop();
    }

    match outline.as_slice() {
        [] => {}
        [only] => {
            if let (Ok(x), Ok(y)) = (u32::try_from(only.x), u32::try_from(only.y))
                && x < width
                && y < height
            {
                canvas.put_pixel(x, y, FILLED);
            }
        }
        points => draw_polygon_mut(&mut canvas, points, FILLED),
    }
    canvas
}

/// Clamps a floating-point coordinate onto `[0, limit]`.
fn clip(value: f32, limit: u32) -> u32 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    let limit_f = limit as f32;
    if value >= limit_f {
        return limit;
    }
    // In range [0, limit) after the checks above.
    value as u32
}
