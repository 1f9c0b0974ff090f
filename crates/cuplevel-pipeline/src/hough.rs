//! Gradient circular Hough transform.
//!
//! Finds circular container rims the way the classic two-stage gradient
//! method does: every Canny edge pixel votes for possible centers along
//! its local gradient direction (both ways, once per radius in range);
//! center candidates are accumulator peaks separated by a minimum
//! distance; each candidate's radius is the most supported edge distance
//! within the configured bounds.
//!
//! Candidates are reported strongest-vote first, and callers trust that
//! ranking rather than re-scoring.

use image::GrayImage;

use crate::edge;

/// Hough detector parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoughParams {
    /// Canny low threshold for the voting edge map.
    pub canny_low: f32,
    /// Canny high threshold for the voting edge map.
    pub canny_high: f32,
    /// Smallest radius reported, in pixels. Must be at least 1.
    pub min_radius: u32,
    /// Largest radius reported, in pixels.
    pub max_radius: u32,
    /// Minimum center-accumulator votes for a candidate.
    pub accumulator_threshold: u32,
    /// Minimum distance between reported centers, in pixels.
    pub min_center_distance: f64,
}

/// A detected circle candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleCandidate {
    /// Center x in image coordinates.
    pub cx: f64,
    /// Center y in image coordinates.
    pub cy: f64,
    /// Radius in pixels.
    pub radius: f64,
    /// Center-accumulator votes backing this candidate.
    pub votes: u32,
}

/// Detect circles in a grayscale image.
///
/// Returns candidates ordered by vote count, strongest first, already
/// deduplicated by `min_center_distance`. Empty when nothing clears
/// `accumulator_threshold`.
#[must_use = "returns the circle candidates"]
pub fn detect_circles(image: &GrayImage, params: &HoughParams) -> Vec<CircleCandidate> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 || params.min_radius == 0 || params.min_radius > params.max_radius
    {
        return Vec::new();
    }

    let edges = edge::canny(image, params.canny_low, params.canny_high);
    let gx = imageproc::gradients::horizontal_sobel(image);
    let gy = imageproc::gradients::vertical_sobel(image);

    // Stage 1: center voting along the gradient line.
    let mut accumulator = vec![0u32; (width as usize) * (height as usize)];
    let mut edge_points: Vec<(u32, u32)> = Vec::new();

    for y in 0..height {
        for x in 0..width {
            if edges.get_pixel(x, y).0[0] == 0 {
                continue;
            }
            let dx = f64::from(gx.get_pixel(x, y).0[0]);
            let dy = f64::from(gy.get_pixel(x, y).0[0]);
            let magnitude = dx.hypot(dy);
            if magnitude < 1e-6 {
                continue;
            }
            edge_points.push((x, y));

            let (ux, uy) = (dx / magnitude, dy / magnitude);
            for r in params.min_radius..=params.max_radius {
                let r = f64::from(r);
                for sign in [1.0, -1.0] {
                    let cx = f64::from(x) + sign * r * ux;
                    let cy = f64::from(y) + sign * r * uy;
                    vote(&mut accumulator, width, height, cx, cy);
                }
            }
        }
    }

    // Stage 2: accumulator peaks (3x3 local maxima above threshold),
    // strongest first, then greedy min-distance suppression.
    let mut peaks = local_maxima(&accumulator, width, height, params.accumulator_threshold);
    peaks.sort_by(|a, b| b.2.cmp(&a.2));

    let mut centers: Vec<(u32, u32, u32)> = Vec::new();
    let min_dist_sq = params.min_center_distance * params.min_center_distance;
    for (px, py, votes) in peaks {
        let far_enough = centers.iter().all(|&(qx, qy, _)| {
            let dx = f64::from(px) - f64::from(qx);
            let dy = f64::from(py) - f64::from(qy);
            dx.mul_add(dx, dy * dy) >= min_dist_sq
        });
        if far_enough {
            centers.push((px, py, votes));
        }
    }

    // Stage 3: per-center radius histogram over edge distances.
    centers
        .into_iter()
        .filter_map(|(px, py, votes)| {
            best_radius(&edge_points, px, py, params).map(|radius| CircleCandidate {
                cx: f64::from(px),
                cy: f64::from(py),
                radius,
                votes,
            })
        })
        .collect()
}

fn vote(accumulator: &mut [u32], width: u32, height: u32, cx: f64, cy: f64) {
    let xi = cx.round();
    let yi = cy.round();
    if xi < 0.0 || yi < 0.0 || xi >= f64::from(width) || yi >= f64::from(height) {
        return;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let index = (yi as usize) * (width as usize) + (xi as usize);
    accumulator[index] += 1;
}

/// Cells at or above `threshold` that are maximal within their 3x3
/// neighborhood (ties allowed, so plateau cells all qualify; the
/// min-distance suppression dedups them).
fn local_maxima(accumulator: &[u32], width: u32, height: u32, threshold: u32) -> Vec<(u32, u32, u32)> {
    let w = width as usize;
    let mut peaks = Vec::new();
    for y in 0..height {
        for x in 0..width {
            let votes = accumulator[(y as usize) * w + (x as usize)];
            if votes < threshold.max(1) {
                continue;
            }
            let mut is_peak = true;
            'neighbors: for ny in y.saturating_sub(1)..=(y + 1).min(height - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(width - 1) {
                    if accumulator[(ny as usize) * w + (nx as usize)] > votes {
                        is_peak = false;
                        break 'neighbors;
                    }
                }
            }
            if is_peak {
                peaks.push((x, y, votes));
            }
        }
    }
    peaks
}

/// Most supported radius for a center: histogram of rounded edge-pixel
/// distances within `[min_radius, max_radius]`. Requires the winning bin
/// to carry at least `accumulator_threshold` edge pixels.
fn best_radius(edge_points: &[(u32, u32)], cx: u32, cy: u32, params: &HoughParams) -> Option<f64> {
    let bins = (params.max_radius - params.min_radius + 1) as usize;
    let mut histogram = vec![0u32; bins];
    for &(x, y) in edge_points {
        let dx = f64::from(x) - f64::from(cx);
        let dy = f64::from(y) - f64::from(cy);
        let distance = dx.hypot(dy).round();
        if distance < f64::from(params.min_radius) || distance > f64::from(params.max_radius) {
            continue;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let bin = (distance as u32 - params.min_radius) as usize;
        histogram[bin] += 1;
    }

    let (best_bin, &support) = histogram
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))?;
    if support < params.accumulator_threshold.max(1) {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    Some(f64::from(params.min_radius + best_bin as u32))
}
