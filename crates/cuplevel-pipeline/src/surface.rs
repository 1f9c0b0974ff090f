//! Liquid surface detection: a coverage-threshold edge scan down the
//! container interior.
//!
//! The search window is the shape's vertical extent minus a top margin
//! (rim shadows read as dark and would otherwise fake a surface), clipped
//! to the image. Within the window, a pixel counts as liquid when it lies
//! inside the interior mask *and* its intensity is below the darkness
//! threshold — opaque beverages darker than the empty container, a hard
//! domain assumption. Scanning top to bottom, the first row whose liquid
//! fraction (over the shape's column span) exceeds the coverage fraction
//! is the surface. No sub-pixel interpolation, no multi-candidate
//! disambiguation; a flat, frame-aligned surface is assumed.

use image::GrayImage;

use crate::types::ContainerShape;

/// Surface scan parameters, a slice of the full pipeline config.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceParams {
    /// Fraction of the container height excluded from the top of the
    /// search window.
    pub margin_fraction: f64,
    /// Intensity below which an in-mask pixel counts as liquid.
    pub darkness_threshold: u8,
    /// Minimum liquid fraction for a row to qualify as the surface.
    pub coverage_fraction: f64,
}

/// Find the absolute image row of the liquid's top surface.
///
/// `image` is the grayscale input, `mask` the rasterized interior
/// (mask membership distinguishes genuinely dark liquid from the zeroed
/// outside region). Returns `None` when the clipped window is empty or no
/// row meets the coverage criterion — an empty container, not an error.
#[must_use = "returns the surface row, if any"]
pub fn find_surface(
    image: &GrayImage,
    mask: &GrayImage,
    shape: &ContainerShape,
    params: &SurfaceParams,
) -> Option<u32> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let extent = shape.extent();
    if extent.height() <= 0.0 {
        return None;
    }

    // Window rows: [top + margin * height, bottom], clipped. A start below
    // the image means nothing to scan; a bottom past the image merely
    // clamps to the last row.
    let margin = extent.height() * params.margin_fraction;
    let start = window_start(extent.top + margin, height)?;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let end = extent.bottom.round().max(0.0).min(f64::from(height - 1)) as u32;
    let (left, right) = column_span(extent.left, extent.right, width)?;

    let span = f64::from(right - left + 1);
    for y in start..=end {
        let mut liquid = 0u32;
        for x in left..=right {
            let inside = mask.get_pixel(x, y).0[0] > 0;
            if inside && image.get_pixel(x, y).0[0] < params.darkness_threshold {
                liquid += 1;
            }
        }
        if f64::from(liquid) / span > params.coverage_fraction {
            return Some(y);
        }
    }
    None
}

/// Clamp the scan window's first row into `[0, height)`; `None` when it
/// lies below the image, meaning the whole window is out of frame.
fn window_start(y: f64, height: u32) -> Option<u32> {
    if y >= f64::from(height) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some(y.round().max(0.0).min(f64::from(height - 1)) as u32)
}

fn column_span(left: f64, right: f64, width: u32) -> Option<(u32, u32)> {
    if right < 0.0 || left >= f64::from(width) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let left = left.round().max(0.0) as u32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let right = right.round().min(f64::from(width - 1)) as u32;
    (left <= right).then_some((left, right))
}
