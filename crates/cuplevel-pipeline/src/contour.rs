//! Closed boundary curves from a binary edge map.
//!
//! Suzuki-Abe border following (via `imageproc::contours::find_contours`)
//! turns the Canny edge map into boundary curves. The ellipse and polygon
//! locators keep only curves that could plausibly be a container rim:
//! enough points to fit against and enough enclosed area to matter.
//! Enclosed area — the sole plausibility proxy — is the shoelace area of
//! the curve's points.

use image::GrayImage;

use crate::types::Point;

/// A closed boundary curve with its enclosed (shoelace) area.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedCurve {
    /// Boundary points in traversal order, not closed.
    pub points: Vec<Point>,
    /// Absolute enclosed area in pixels².
    pub area: f64,
}

/// Extract candidate closed curves from a binary edge map.
///
/// Curves with fewer than `min_points` points or enclosed area below
/// `min_area` are discarded. Remaining curves keep the tracer's reporting
/// order, which downstream tie-breaking relies on (first seen wins).
#[must_use = "returns the candidate curves"]
pub fn closed_curves(edges: &GrayImage, min_points: usize, min_area: f64) -> Vec<ClosedCurve> {
    let contours: Vec<imageproc::contours::Contour<u32>> =
        imageproc::contours::find_contours(edges);

    contours
        .into_iter()
        .filter(|c| c.points.len() >= min_points)
        .filter_map(|c| {
            let points: Vec<Point> = c
                .points
                .into_iter()
                .map(|p| Point::new(f64::from(p.x), f64::from(p.y)))
                .collect();
            let area = shoelace_area(&points);
            (area >= min_area).then_some(ClosedCurve { points, area })
        })
        .collect()
}

/// Absolute enclosed area of a closed point sequence (shoelace formula).
///
/// The closing segment from the last point back to the first is implied.
/// Fewer than 3 points enclose nothing and yield 0.
#[must_use]
pub fn shoelace_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        twice_area += p.x * q.y - q.x * p.y;
    }
    (twice_area / 2.0).abs()
}

/// The curve with the maximum enclosed area, ties broken by first-seen
/// order.
#[must_use]
pub fn largest_curve(curves: &[ClosedCurve]) -> Option<&ClosedCurve> {
    let mut best: Option<&ClosedCurve> = None;
    for curve in curves {
        if best.is_none_or(|b| curve.area > b.area) {
            best = Some(curve);
        }
    }
    best
}
