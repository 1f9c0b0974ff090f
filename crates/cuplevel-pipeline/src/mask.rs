//! Interior mask: rasterize the container shape and cut the image to it.
//!
//! A pure function of shape and image dimensions: 255 inside the rim,
//! 0 outside. ANDing the mask with the grayscale image zeroes everything
//! outside the container so the surface scan only ever sees interior
//! pixels. Degenerate shapes rasterize to an empty mask, which the
//! surface stage reports as "not found"; shapes overhanging the frame
//! clip silently.

use image::{GrayImage, Luma};

use crate::types::ContainerShape;

/// Rasterize the filled container shape into a binary mask.
#[must_use = "returns the interior mask"]
pub fn interior_mask(shape: &ContainerShape, width: u32, height: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    if width == 0 || height == 0 || shape.is_degenerate() {
        return mask;
    }

    match shape {
        ContainerShape::Circle { center, radius } => {
            #[allow(clippy::cast_possible_truncation)]
            imageproc::drawing::draw_filled_circle_mut(
                &mut mask,
                (center.x.round() as i32, center.y.round() as i32),
                radius.round() as i32,
                Luma([255]),
            );
        }
        ContainerShape::Ellipse {
            center,
            axes: (a, b),
            rotation,
        } => {
            // Point-in-ellipse test over the bounding box; imageproc's
            // ellipse drawing is axis-aligned only and the fit reports a
            // rotation.
            let extent = shape.extent();
            let (sin, cos) = rotation.sin_cos();
            let (x0, x1) = clip_range(extent.left, extent.right, width);
            let (y0, y1) = clip_range(extent.top, extent.bottom, height);
            for y in y0..=y1 {
                for x in x0..=x1 {
                    let dx = f64::from(x) - center.x;
                    let dy = f64::from(y) - center.y;
                    let u = (dx * cos + dy * sin) / a;
                    let v = (dy * cos - dx * sin) / b;
                    if u * u + v * v <= 1.0 {
                        mask.put_pixel(x, y, Luma([255]));
                    }
                }
            }
        }
        ContainerShape::Polygon { points } => {
            #[allow(clippy::cast_possible_truncation)]
            let mut vertices: Vec<imageproc::point::Point<i32>> = points
                .iter()
                .map(|p| imageproc::point::Point::new(p.x.round() as i32, p.y.round() as i32))
                .collect();
            vertices.dedup();
            // draw_polygon_mut requires an open ring.
            if vertices.len() > 1 && vertices.first() == vertices.last() {
                vertices.pop();
            }
            if vertices.len() >= 3 {
                imageproc::drawing::draw_polygon_mut(&mut mask, &vertices, Luma([255]));
            }
        }
    }

    mask
}

/// Zero out every pixel outside the mask (bitwise AND; the mask is 0/255).
#[must_use = "returns the masked image"]
pub fn apply_mask(image: &GrayImage, mask: &GrayImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([image.get_pixel(x, y).0[0] & mask.get_pixel(x, y).0[0]])
    })
}

/// Clip a float range to valid pixel indices `[0, limit)`.
fn clip_range(low: f64, high: f64, limit: u32) -> (u32, u32) {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let low = low.floor().max(0.0) as u32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let high = high.ceil().max(0.0) as u32;
    (low.min(limit - 1), high.min(limit - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn count_set(mask: &GrayImage) -> u32 {
        mask.pixels().map(|p| u32::from(p.0[0] == 255)).sum()
    }

    #[test]
    fn circle_mask_area_is_plausible() {
        let shape = ContainerShape::Circle {
            center: Point::new(50.0, 50.0),
            radius: 20.0,
        };
        let mask = interior_mask(&shape, 100, 100);
        let area = f64::from(count_set(&mask));
        let expected = std::f64::consts::PI * 20.0 * 20.0;
        assert!(
            (area - expected).abs() / expected < 0.1,
            "mask area {area} vs expected {expected}"
        );
    }

    #[test]
    fn circle_mask_interior_and_exterior() {
        let shape = ContainerShape::Circle {
            center: Point::new(50.0, 50.0),
            radius: 20.0,
        };
        let mask = interior_mask(&shape, 100, 100);
        assert_eq!(mask.get_pixel(50, 50).0[0], 255, "center must be inside");
        assert_eq!(mask.get_pixel(5, 5).0[0], 0, "far corner must be outside");
    }

    #[test]
    fn rotated_ellipse_mask_respects_rotation() {
        let shape = ContainerShape::Ellipse {
            center: Point::new(50.0, 50.0),
            axes: (30.0, 10.0),
            rotation: std::f64::consts::FRAC_PI_2,
        };
        let mask = interior_mask(&shape, 100, 100);
        // Major axis is vertical now.
        assert_eq!(mask.get_pixel(50, 75).0[0], 255);
        assert_eq!(mask.get_pixel(75, 50).0[0], 0);
    }

    #[test]
    fn polygon_mask_fills_triangle() {
        let shape = ContainerShape::Polygon {
            points: vec![
                Point::new(10.0, 10.0),
                Point::new(60.0, 10.0),
                Point::new(35.0, 60.0),
            ],
        };
        let mask = interior_mask(&shape, 80, 80);
        assert_eq!(mask.get_pixel(35, 20).0[0], 255, "centroid-ish inside");
        assert_eq!(mask.get_pixel(5, 70).0[0], 0, "outside");
    }

    #[test]
    fn degenerate_shapes_yield_empty_mask() {
        let zero_circle = ContainerShape::Circle {
            center: Point::new(10.0, 10.0),
            radius: 0.0,
        };
        let line = ContainerShape::Polygon {
            points: vec![Point::new(0.0, 0.0), Point::new(5.0, 5.0)],
        };
        assert_eq!(count_set(&interior_mask(&zero_circle, 20, 20)), 0);
        assert_eq!(count_set(&interior_mask(&line, 20, 20)), 0);
    }

    #[test]
    fn shape_overhanging_image_edge_clips() {
        let shape = ContainerShape::Circle {
            center: Point::new(5.0, 5.0),
            radius: 30.0,
        };
        let mask = interior_mask(&shape, 40, 40);
        assert!(count_set(&mask) > 0);
        assert_eq!(mask.width(), 40);
        assert_eq!(mask.height(), 40);
    }

    #[test]
    fn closed_polygon_ring_is_accepted() {
        // Explicitly closed input (first == last) must not be rejected.
        let shape = ContainerShape::Polygon {
            points: vec![
                Point::new(10.0, 10.0),
                Point::new(60.0, 10.0),
                Point::new(35.0, 60.0),
                Point::new(10.0, 10.0),
            ],
        };
        let mask = interior_mask(&shape, 80, 80);
        assert!(count_set(&mask) > 0);
    }

    #[test]
    fn apply_mask_zeroes_outside() {
        let image = GrayImage::from_pixel(20, 20, image::Luma([200]));
        let shape = ContainerShape::Circle {
            center: Point::new(10.0, 10.0),
            radius: 5.0,
        };
        let mask = interior_mask(&shape, 20, 20);
        let masked = apply_mask(&image, &mask);
        assert_eq!(masked.get_pixel(10, 10).0[0], 200);
        assert_eq!(masked.get_pixel(0, 0).0[0], 0);
    }
}
