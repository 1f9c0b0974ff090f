//! cuplevel-annotate: draw estimation results onto the source image.
//!
//! Consumes a [`FillReport`] from `cuplevel-pipeline` and renders its
//! geometry for human inspection: the located rim in green and the
//! detected liquid surface as a thick red line across the container. The
//! pipeline itself never draws; all presentation lives here.

use image::{Rgba, RgbaImage};
use imageproc::drawing;

use cuplevel_pipeline::{ContainerShape, FillReport, Point};

/// Rim outline color.
const SHAPE_COLOR: Rgba<u8> = Rgba([0, 200, 0, 255]);

/// Surface line color.
const SURFACE_COLOR: Rgba<u8> = Rgba([220, 0, 0, 255]);

/// Surface line thickness in rows.
const SURFACE_THICKNESS: i64 = 4;

/// Segments used to approximate an ellipse outline.
const ELLIPSE_SEGMENTS: u32 = 72;

/// Render a report onto a copy of the original image.
///
/// Draws whatever geometry the report carries: nothing for a report with
/// no shape, shape only when no surface was found. Polygon shapes
/// additionally get the coarse cylinder sketch derived from their
/// bounding box (rim and base ellipses plus side lines), mirroring how a
/// boxy container reads as a 3-D vessel.
#[must_use = "returns the annotated image"]
pub fn annotate(image: &RgbaImage, report: &FillReport) -> RgbaImage {
    let mut canvas = image.clone();

    if let Some(shape) = &report.shape {
        draw_shape(&mut canvas, shape);
        if let Some(row) = report.surface_row {
            draw_surface_line(&mut canvas, shape, row);
        }
    }

    canvas
}

fn draw_shape(canvas: &mut RgbaImage, shape: &ContainerShape) {
    match shape {
        ContainerShape::Circle { center, radius } => {
            #[allow(clippy::cast_possible_truncation)]
            drawing::draw_hollow_circle_mut(
                canvas,
                (center.x.round() as i32, center.y.round() as i32),
                radius.round() as i32,
                SHAPE_COLOR,
            );
        }
        ContainerShape::Ellipse {
            center,
            axes: (a, b),
            rotation,
        } => {
            draw_rotated_ellipse(canvas, *center, *a, *b, *rotation);
        }
        ContainerShape::Polygon { points } => {
            draw_closed_polyline(canvas, points);
            draw_cylinder_sketch(canvas, shape);
        }
    }
}

/// Ellipse outline as a polyline; `imageproc` only draws axis-aligned
/// ellipses and the fit reports a rotation.
fn draw_rotated_ellipse(canvas: &mut RgbaImage, center: Point, a: f64, b: f64, rotation: f64) {
    let (sin, cos) = rotation.sin_cos();
    let vertex = |i: u32| {
        let t = 2.0 * std::f64::consts::PI * f64::from(i) / f64::from(ELLIPSE_SEGMENTS);
        let (u, v) = (a * t.cos(), b * t.sin());
        #[allow(clippy::cast_possible_truncation)]
        (
            (center.x + u * cos - v * sin) as f32,
            (center.y + u * sin + v * cos) as f32,
        )
    };
    for i in 0..ELLIPSE_SEGMENTS {
        drawing::draw_line_segment_mut(canvas, vertex(i), vertex(i + 1), SHAPE_COLOR);
    }
}

fn draw_closed_polyline(canvas: &mut RgbaImage, points: &[Point]) {
    if points.len() < 2 {
        return;
    }
    #[allow(clippy::cast_possible_truncation)]
    let to_f32 = |p: &Point| (p.x as f32, p.y as f32);
    for pair in points.windows(2) {
        drawing::draw_line_segment_mut(canvas, to_f32(&pair[0]), to_f32(&pair[1]), SHAPE_COLOR);
    }
    if let (Some(first), Some(last)) = (points.first(), points.last()) {
        drawing::draw_line_segment_mut(canvas, to_f32(last), to_f32(first), SHAPE_COLOR);
    }
}

/// Coarse cylinder read of a boxy silhouette: rim ellipse at the top of
/// the bounding box, base ellipse at the bottom, sides drawn slightly
/// inward at the bottom.
fn draw_cylinder_sketch(canvas: &mut RgbaImage, shape: &ContainerShape) {
    let extent = shape.extent();
    let width = extent.right - extent.left;
    if width <= 0.0 || extent.height() <= 0.0 {
        return;
    }
    let cx = (extent.left + extent.right) / 2.0;
    let semi_w = width / 2.0;
    let semi_h = (width / 8.0).max(2.0);

    draw_rotated_ellipse(canvas, Point::new(cx, extent.top), semi_w, semi_h, 0.0);
    draw_rotated_ellipse(canvas, Point::new(cx, extent.bottom), semi_w, semi_h, 0.0);

    let inset = width * 0.05;
    #[allow(clippy::cast_possible_truncation)]
    for (top_x, bottom_x) in [
        (extent.left, extent.left + inset),
        (extent.right, extent.right - inset),
    ] {
        drawing::draw_line_segment_mut(
            canvas,
            (top_x as f32, extent.top as f32),
            (bottom_x as f32, extent.bottom as f32),
            SHAPE_COLOR,
        );
    }
}

/// Thick horizontal line across the container's horizontal extent at the
/// detected surface row, clipped to the image.
fn draw_surface_line(canvas: &mut RgbaImage, shape: &ContainerShape, row: u32) {
    let extent = shape.extent();
    let left = extent.left.max(0.0);
    let right = extent.right.min(f64::from(canvas.width().saturating_sub(1)));
    if left > right {
        return;
    }
    for offset in 0..SURFACE_THICKNESS {
        let y = i64::from(row) + offset - SURFACE_THICKNESS / 2;
        if y < 0 || y >= i64::from(canvas.height()) {
            continue;
        }
        #[allow(clippy::cast_precision_loss)]
        drawing::draw_line_segment_mut(
            canvas,
            (left as f32, y as f32),
            (right as f32, y as f32),
            SURFACE_COLOR,
        );
    }
}
