//! Canny edge detection for container silhouette extraction.
//!
//! Wraps [`imageproc::edges::canny`] to produce the binary edge map the
//! ellipse and polygon locators trace closed curves from (and the circle
//! locator votes from). White pixels (255) are edges, black (0) are
//! background.

use image::GrayImage;

/// Minimum allowed Canny threshold.
///
/// A zero low threshold treats every pixel with any gradient as a
/// potential edge, producing a dense edge map that swamps the contour
/// stage with noise curves.
pub const MIN_THRESHOLD: f32 = 1.0;
const _: () = assert!(MIN_THRESHOLD > 0.0);

/// Detect edges using the Canny algorithm.
///
/// Returns a binary image: 255 for edge pixels, 0 for non-edge.
/// Gradient magnitudes above `high_threshold` are definite edges; those
/// between the thresholds are edges only when connected to a definite edge.
///
/// Both thresholds are clamped to at least [`MIN_THRESHOLD`] and
/// `low_threshold` is clamped to at most `high_threshold`, so degenerate
/// slider values cannot produce a pathological edge map.
#[must_use = "returns the binary edge map"]
pub fn canny(image: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    let high = high_threshold.max(MIN_THRESHOLD);
    let low = low_threshold.max(MIN_THRESHOLD).min(high);
    imageproc::edges::canny(image, low, high)
}
