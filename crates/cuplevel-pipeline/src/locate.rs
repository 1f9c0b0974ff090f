//! Container location: find the most plausible rim silhouette.
//!
//! One operation, three interchangeable strategies selected by
//! [`ShapeModel`](crate::types::ShapeModel):
//!
//! - **Circle** — gradient circular Hough; the detector's own ranking is
//!   trusted and the first candidate wins.
//! - **Ellipse** — closed boundary curves from the Canny edge map, a
//!   direct least-squares ellipse fit per surviving curve, and the fit
//!   whose *source curve* encloses the most area wins. Enclosed area is
//!   the sole plausibility proxy standing in for a real cup classifier.
//! - **Polygon** — the single largest-area closed curve, kept as-is.
//!
//! Returns `None` when nothing clears the area/vote floor: "container not
//! found", terminal for this image.

use image::GrayImage;

use crate::contour::{self, ClosedCurve};
use crate::hough::{self, HoughParams};
use crate::types::{ContainerShape, PipelineConfig, Point, ShapeModel};
use crate::{conic, edge};

/// Minimum curve points for an ellipse fit candidate; matches the fit's
/// own minimum so no admitted curve is unfittable.
const ELLIPSE_MIN_POINTS: usize = 6;

/// Minimum curve points for a polygon candidate.
const POLYGON_MIN_POINTS: usize = 3;

/// Locate the container rim in a denoised grayscale image.
///
/// `None` means no candidate cleared the configured floors; callers treat
/// that as "container not found" and do not retry.
#[must_use = "returns the located container shape"]
pub fn locate(image: &GrayImage, config: &PipelineConfig) -> Option<ContainerShape> {
    match config.shape_model {
        ShapeModel::Circle => locate_circle(image, config),
        ShapeModel::Ellipse => locate_ellipse(image, config),
        ShapeModel::Polygon => locate_polygon(image, config),
    }
}

fn locate_circle(image: &GrayImage, config: &PipelineConfig) -> Option<ContainerShape> {
    let params = HoughParams {
        canny_low: config.canny_low,
        canny_high: config.canny_high,
        min_radius: config.min_radius,
        max_radius: config.max_radius,
        accumulator_threshold: config.accumulator_threshold,
        min_center_distance: config.min_center_distance,
    };
    let candidate = hough::detect_circles(image, &params).into_iter().next()?;
    Some(ContainerShape::Circle {
        center: Point::new(candidate.cx, candidate.cy),
        radius: candidate.radius,
    })
}

fn locate_ellipse(image: &GrayImage, config: &PipelineConfig) -> Option<ContainerShape> {
    let curves = candidate_curves(image, config, ELLIPSE_MIN_POINTS);

    // Fit every surviving curve; keep the fit backed by the largest source
    // curve (strictly greater, so ties go to the first seen).
    let mut best: Option<(f64, conic::FittedEllipse)> = None;
    for curve in &curves {
        let Some(fit) = conic::fit_ellipse(&curve.points) else {
            continue;
        };
        if best.is_none_or(|(area, _)| curve.area > area) {
            best = Some((curve.area, fit));
        }
    }

    best.map(|(_, fit)| ContainerShape::Ellipse {
        center: fit.center,
        axes: fit.axes,
        rotation: fit.rotation,
    })
}

fn locate_polygon(image: &GrayImage, config: &PipelineConfig) -> Option<ContainerShape> {
    let curves = candidate_curves(image, config, POLYGON_MIN_POINTS);
    contour::largest_curve(&curves).map(|curve| ContainerShape::Polygon {
        points: curve.points.clone(),
    })
}

fn candidate_curves(
    image: &GrayImage,
    config: &PipelineConfig,
    min_points: usize,
) -> Vec<ClosedCurve> {
    let edges = edge::canny(image, config.canny_low, config.canny_high);
    contour::closed_curves(&edges, min_points, config.min_area)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Light filled ellipse on a dark background.
    fn ellipse_image(width: u32, height: u32, cx: f64, cy: f64, a: f64, b: f64) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            let u = (f64::from(x) - cx) / a;
            let v = (f64::from(y) - cy) / b;
            if u * u + v * v <= 1.0 {
                image::Luma([190])
            } else {
                image::Luma([40])
            }
        })
    }

    fn config(model: ShapeModel) -> PipelineConfig {
        PipelineConfig {
            shape_model: model,
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn uniform_image_locates_nothing() {
        let img = GrayImage::from_pixel(100, 100, image::Luma([128]));
        for model in [ShapeModel::Circle, ShapeModel::Ellipse, ShapeModel::Polygon] {
            assert!(
                locate(&img, &config(model)).is_none(),
                "{model:?} located a shape in a uniform image"
            );
        }
    }

    #[test]
    fn circle_model_finds_synthetic_disk() {
        let img = ellipse_image(200, 200, 100.0, 100.0, 55.0, 55.0);
        let shape = locate(&img, &config(ShapeModel::Circle)).unwrap();
        let ContainerShape::Circle { center, radius } = shape else {
            unreachable!("circle model must return a circle, got {shape:?}");
        };
        assert!((center.x - 100.0).abs() <= 3.0, "cx = {}", center.x);
        assert!((center.y - 100.0).abs() <= 3.0, "cy = {}", center.y);
        assert!((radius - 55.0).abs() <= 3.0, "r = {radius}");
    }

    #[test]
    fn ellipse_model_area_within_five_percent() {
        let img = ellipse_image(240, 200, 120.0, 100.0, 70.0, 45.0);
        let shape = locate(&img, &config(ShapeModel::Ellipse)).unwrap();
        let ContainerShape::Ellipse { axes: (a, b), .. } = shape else {
            unreachable!("ellipse model must return an ellipse, got {shape:?}");
        };
        let fitted_area = std::f64::consts::PI * a * b;
        let true_area = std::f64::consts::PI * 70.0 * 45.0;
        let relative = (fitted_area - true_area).abs() / true_area;
        assert!(
            relative < 0.05,
            "fitted area {fitted_area} deviates {relative:.3} from {true_area}"
        );
    }

    #[test]
    fn polygon_model_returns_largest_curve() {
        let mut img = ellipse_image(240, 200, 120.0, 100.0, 70.0, 45.0);
        // A second, smaller blob must not win.
        for y in 10..30 {
            for x in 10..30 {
                img.put_pixel(x, y, image::Luma([190]));
            }
        }
        let shape = locate(&img, &config(ShapeModel::Polygon)).unwrap();
        let ContainerShape::Polygon { points } = shape else {
            unreachable!("polygon model must return a polygon, got {shape:?}");
        };
        let extent = ContainerShape::Polygon { points }.extent();
        assert!(
            extent.right - extent.left > 100.0,
            "picked the small blob: {extent:?}"
        );
    }

    #[test]
    fn min_area_floor_rejects_small_shapes() {
        let img = ellipse_image(100, 100, 50.0, 50.0, 12.0, 10.0);
        let strict = PipelineConfig {
            shape_model: ShapeModel::Ellipse,
            min_area: 10_000.0,
            ..PipelineConfig::default()
        };
        assert!(locate(&img, &strict).is_none());
    }
}
