//! Direct least-squares ellipse fitting (Fitzgibbon et al., 1999).
//!
//! Fits an ellipse to a closed boundary curve's point set by solving the
//! constrained eigenvalue problem that enforces the ellipse condition
//! `B² − 4AC < 0` via the constraint matrix C₁. The general conic solution
//! is then converted to geometric center/axes/rotation form.
//!
//! The generalized 3×3 eigensystem is solved explicitly (characteristic
//! cubic plus adjugate null vectors) because `C₁⁻¹ M` is not symmetric in
//! general, ruling out the symmetric eigen solvers.

use nalgebra::{DMatrix, Matrix3, Vector3, Vector6};

use crate::types::Point;

/// Geometric ellipse parameters recovered from a conic fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedEllipse {
    /// Center in image coordinates.
    pub center: Point,
    /// Semi-axes `(a, b)` with `a >= b`.
    pub axes: (f64, f64),
    /// Rotation of the `a` axis from +x, in radians, in `(-π/2, π/2]`.
    pub rotation: f64,
}

impl FittedEllipse {
    /// Enclosed area, `π a b`.
    #[must_use]
    pub fn area(&self) -> f64 {
        std::f64::consts::PI * self.axes.0 * self.axes.1
    }
}

/// Fit an ellipse to a point set with the direct least-squares method.
///
/// Requires at least 6 points. Returns `None` when the fit fails
/// numerically or the best-fit conic is not an ellipse (collinear or
/// otherwise degenerate input).
#[must_use]
pub fn fit_ellipse(points: &[Point]) -> Option<FittedEllipse> {
    let n = points.len();
    if n < 6 {
        return None;
    }

    // Normalize for numerical stability: shift to the centroid, scale so the
    // mean distance from it is √2.
    let (mean_x, mean_y, scale) = normalization(points);

    // Design matrix D = [x², xy, y², x, y, 1] in normalized coordinates.
    let mut d = DMatrix::<f64>::zeros(n, 6);
    for (i, p) in points.iter().enumerate() {
        let x = (p.x - mean_x) * scale;
        let y = (p.y - mean_y) * scale;
        d[(i, 0)] = x * x;
        d[(i, 1)] = x * y;
        d[(i, 2)] = y * y;
        d[(i, 3)] = x;
        d[(i, 4)] = y;
        d[(i, 5)] = 1.0;
    }

    // Scatter matrix S = Dᵀ D, partitioned into 3×3 blocks
    //   S = [S11 S12; S12ᵀ S22].
    let s = d.transpose() * &d;
    let s11 = s.fixed_view::<3, 3>(0, 0).into_owned();
    let s12 = s.fixed_view::<3, 3>(0, 3).into_owned();
    let s22 = s.fixed_view::<3, 3>(3, 3).into_owned();

    // Ellipse constraint 4AC − B² = 1 expressed as the matrix C₁.
    let c1 = Matrix3::new(0.0, 0.0, 2.0, 0.0, -1.0, 0.0, 2.0, 0.0, 0.0);

    // Reduced system (S11 − S12 S22⁻¹ S12ᵀ) a₁ = λ C₁ a₁.
    let s22_inv = s22.try_inverse()?;
    let reduced = s11 - s12 * s22_inv * s12.transpose();
    let c1_inv = c1.try_inverse()?;

    let a1 = constrained_eigenvector(&(c1_inv * reduced))?;
    let a2 = -s22_inv * s12.transpose() * a1;

    let normalized = Vector6::new(a1[0], a1[1], a1[2], a2[0], a2[1], a2[2]);
    let coeffs = denormalize(&normalized, mean_x, mean_y, scale);

    ellipse_from_conic(&coeffs)
}

/// Normalization parameters: (mean_x, mean_y, scale).
fn normalization(points: &[Point]) -> (f64, f64, f64) {
    #[allow(clippy::cast_precision_loss)]
    let n = points.len() as f64;
    let mean_x: f64 = points.iter().map(|p| p.x).sum::<f64>() / n;
    let mean_y: f64 = points.iter().map(|p| p.y).sum::<f64>() / n;

    let mean_dist: f64 = points
        .iter()
        .map(|p| (p.x - mean_x).hypot(p.y - mean_y))
        .sum::<f64>()
        / n;

    let scale = if mean_dist > 1e-15 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    (mean_x, mean_y, scale)
}

/// Undo the normalization on conic coefficients.
///
/// With x' = s(x − mx), y' = s(y − my), substituting into
/// A'x'² + B'x'y' + C'y'² + D'x' + E'y' + F' = 0 gives the original-frame
/// coefficients below.
fn denormalize(c: &Vector6<f64>, mx: f64, my: f64, s: f64) -> [f64; 6] {
    let s2 = s * s;
    let a = c[0] * s2;
    let b = c[1] * s2;
    let cc = c[2] * s2;
    let d = -2.0 * c[0] * s2 * mx - c[1] * s2 * my + c[3] * s;
    let e = -c[1] * s2 * mx - 2.0 * c[2] * s2 * my + c[4] * s;
    let f = c[0] * s2 * mx * mx + c[1] * s2 * mx * my + c[2] * s2 * my * my
        - c[3] * s * mx
        - c[4] * s * my
        + c[5];
    [a, b, cc, d, e, f]
}

/// Eigenvector of `system` satisfying the ellipse constraint
/// `4 v₀ v₂ − v₁² > 0`.
///
/// Eigenvalues come from the characteristic cubic; eigenvectors from the
/// adjugate null-vector of the shifted matrix. Fitzgibbon guarantees
/// exactly one eigenvalue satisfies the constraint for non-degenerate
/// input.
fn constrained_eigenvector(system: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let a = system;
    let trace = a[(0, 0)] + a[(1, 1)] + a[(2, 2)];
    let minor_sum = a[(0, 0)] * a[(1, 1)] - a[(0, 1)] * a[(1, 0)] + a[(0, 0)] * a[(2, 2)]
        - a[(0, 2)] * a[(2, 0)]
        + a[(1, 1)] * a[(2, 2)]
        - a[(1, 2)] * a[(2, 1)];
    let det = a.determinant();

    // λ³ − tr λ² + Σminors λ − det = 0
    let eigenvalues = real_cubic_roots(1.0, -trace, minor_sum, -det);

    let mut best: Option<Vector3<f64>> = None;
    let mut best_abs = f64::MAX;
    for ev in eigenvalues {
        let shifted = system - Matrix3::identity() * ev;
        let Some(v) = null_vector(&shifted) else {
            continue;
        };
        let constraint = 4.0 * v[0] * v[2] - v[1] * v[1];
        if constraint > 0.0 && ev.abs() < best_abs {
            best_abs = ev.abs();
            best = Some(v);
        }
    }
    best
}

/// Null vector of a (near-)singular 3×3 matrix.
///
/// For a rank-2 matrix every row of the adjugate is proportional to the
/// null vector; pick the row with the largest norm.
fn null_vector(m: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let cofactor_rows = [
        Vector3::new(
            m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)],
            -(m[(1, 0)] * m[(2, 2)] - m[(1, 2)] * m[(2, 0)]),
            m[(1, 0)] * m[(2, 1)] - m[(1, 1)] * m[(2, 0)],
        ),
        Vector3::new(
            -(m[(0, 1)] * m[(2, 2)] - m[(0, 2)] * m[(2, 1)]),
            m[(0, 0)] * m[(2, 2)] - m[(0, 2)] * m[(2, 0)],
            -(m[(0, 0)] * m[(2, 1)] - m[(0, 1)] * m[(2, 0)]),
        ),
        Vector3::new(
            m[(0, 1)] * m[(1, 2)] - m[(0, 2)] * m[(1, 1)],
            -(m[(0, 0)] * m[(1, 2)] - m[(0, 2)] * m[(1, 0)]),
            m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)],
        ),
    ];

    let mut best = &cofactor_rows[0];
    let mut best_norm = best.norm_squared();
    for row in &cofactor_rows[1..] {
        let n = row.norm_squared();
        if n > best_norm {
            best = row;
            best_norm = n;
        }
    }

    if best_norm < 1e-30 {
        return None;
    }
    Some(best / best_norm.sqrt())
}

/// Real roots of a x³ + b x² + c x + d = 0 (one or three).
fn real_cubic_roots(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    // Depress: x = t − b/(3a), giving t³ + pt + q = 0.
    let a_inv = 1.0 / a;
    let b_ = b * a_inv;
    let c_ = c * a_inv;
    let d_ = d * a_inv;

    let p = c_ - b_ * b_ / 3.0;
    let q = 2.0 * b_ * b_ * b_ / 27.0 - b_ * c_ / 3.0 + d_;

    let discriminant = -4.0 * p * p * p - 27.0 * q * q;
    let shift = -b_ / 3.0;

    if discriminant >= 0.0 {
        // Three real roots (possibly repeated) — trigonometric form.
        let r = (-p / 3.0).sqrt();
        let cos_arg = if r.abs() < 1e-15 {
            0.0
        } else {
            (-q / (2.0 * r * r * r)).clamp(-1.0, 1.0)
        };
        let theta = cos_arg.acos();
        let two_r = 2.0 * r;
        vec![
            two_r * (theta / 3.0).cos() + shift,
            two_r * ((theta + 2.0 * std::f64::consts::PI) / 3.0).cos() + shift,
            two_r * ((theta + 4.0 * std::f64::consts::PI) / 3.0).cos() + shift,
        ]
    } else {
        // One real root — Cardano.
        let sqrt_disc = (q * q / 4.0 + p * p * p / 27.0).sqrt();
        let u = (-q / 2.0 + sqrt_disc).cbrt();
        let v = (-q / 2.0 - sqrt_disc).cbrt();
        vec![u + v + shift]
    }
}

/// Convert general conic coefficients `[A, B, C, D, E, F]`
/// (A x² + B xy + C y² + D x + E y + F = 0) to geometric form.
///
/// Returns `None` unless the conic is a real, finite ellipse.
fn ellipse_from_conic(coeffs: &[f64; 6]) -> Option<FittedEllipse> {
    // The fit determines coefficients only up to sign; normalize so the
    // quadratic form is positive definite (A + C > 0), otherwise the
    // major/minor eigenvalues come out swapped.
    let [a, b, c, d, e, f] = if coeffs[0] + coeffs[2] < 0.0 {
        [
            -coeffs[0], -coeffs[1], -coeffs[2], -coeffs[3], -coeffs[4], -coeffs[5],
        ]
    } else {
        *coeffs
    };

    // Ellipse condition.
    let delta = b * b - 4.0 * a * c;
    if delta >= 0.0 {
        return None;
    }

    let cx = (2.0 * c * d - b * e) / delta;
    let cy = (2.0 * a * e - b * d) / delta;

    // Conic value at the center; the centered conic is
    // A u² + B uv + C v² + F_c = 0.
    let f_c = a * cx * cx + b * cx * cy + c * cy * cy + d * cx + e * cy + f;

    // Eigenvalues of the quadratic form [[A, B/2], [B/2, C]]. λ_min carries
    // the major axis.
    let half = (a + c) / 2.0;
    let spread = ((a - c) / 2.0).hypot(b / 2.0);
    let lambda_min = half - spread;
    let lambda_max = half + spread;

    let major_sq = -f_c / lambda_min;
    let minor_sq = -f_c / lambda_max;
    if !(major_sq.is_finite() && minor_sq.is_finite()) || major_sq <= 0.0 || minor_sq <= 0.0 {
        return None;
    }

    let rotation = if b.abs() < 1e-12 {
        if a <= c { 0.0 } else { std::f64::consts::FRAC_PI_2 }
    } else {
        (lambda_min - a).atan2(b / 2.0)
    };
    // Fold into (-π/2, π/2].
    let rotation = if rotation > std::f64::consts::FRAC_PI_2 {
        rotation - std::f64::consts::PI
    } else if rotation <= -std::f64::consts::FRAC_PI_2 {
        rotation + std::f64::consts::PI
    } else {
        rotation
    };

    Some(FittedEllipse {
        center: Point::new(cx, cy),
        axes: (major_sq.sqrt(), minor_sq.sqrt()),
        rotation,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Sample `n` points on an ellipse boundary.
    fn ellipse_samples(cx: f64, cy: f64, a: f64, b: f64, theta: f64, n: usize) -> Vec<Point> {
        #[allow(clippy::cast_precision_loss)]
        (0..n)
            .map(|i| {
                let t = 2.0 * std::f64::consts::PI * (i as f64) / (n as f64);
                let (u, v) = (a * t.cos(), b * t.sin());
                let (sin, cos) = theta.sin_cos();
                Point::new(cx + u * cos - v * sin, cy + u * sin + v * cos)
            })
            .collect()
    }

    #[test]
    fn too_few_points_returns_none() {
        let points = ellipse_samples(0.0, 0.0, 10.0, 5.0, 0.0, 5);
        assert!(fit_ellipse(&points).is_none());
    }

    #[test]
    fn six_points_suffice() {
        // The minimum the locator admits must be fittable.
        let points = ellipse_samples(50.0, 50.0, 30.0, 20.0, 0.2, 6);
        let fit = fit_ellipse(&points).unwrap();
        assert!((fit.axes.0 - 30.0).abs() < 0.5, "a = {}", fit.axes.0);
        assert!((fit.axes.1 - 20.0).abs() < 0.5, "b = {}", fit.axes.1);
    }

    #[test]
    fn collinear_points_return_none() {
        #[allow(clippy::cast_precision_loss)]
        let points: Vec<Point> = (0..20).map(|i| Point::new(i as f64, 2.0 * i as f64)).collect();
        assert!(fit_ellipse(&points).is_none());
    }

    #[test]
    fn recovers_circle() {
        let points = ellipse_samples(50.0, 60.0, 20.0, 20.0, 0.0, 48);
        let fit = fit_ellipse(&points).unwrap();
        assert!((fit.center.x - 50.0).abs() < 0.1, "cx = {}", fit.center.x);
        assert!((fit.center.y - 60.0).abs() < 0.1, "cy = {}", fit.center.y);
        assert!((fit.axes.0 - 20.0).abs() < 0.1, "a = {}", fit.axes.0);
        assert!((fit.axes.1 - 20.0).abs() < 0.1, "b = {}", fit.axes.1);
    }

    #[test]
    fn recovers_axis_aligned_ellipse() {
        let points = ellipse_samples(100.0, 80.0, 40.0, 25.0, 0.0, 64);
        let fit = fit_ellipse(&points).unwrap();
        assert!((fit.center.x - 100.0).abs() < 0.1);
        assert!((fit.center.y - 80.0).abs() < 0.1);
        assert!((fit.axes.0 - 40.0).abs() < 0.2);
        assert!((fit.axes.1 - 25.0).abs() < 0.2);
        assert!(fit.rotation.abs() < 0.05, "rotation = {}", fit.rotation);
    }

    #[test]
    fn recovers_rotated_ellipse() {
        let theta = 0.5;
        let points = ellipse_samples(30.0, 40.0, 35.0, 15.0, theta, 64);
        let fit = fit_ellipse(&points).unwrap();
        assert!((fit.axes.0 - 35.0).abs() < 0.2, "a = {}", fit.axes.0);
        assert!((fit.axes.1 - 15.0).abs() < 0.2, "b = {}", fit.axes.1);
        assert!(
            (fit.rotation - theta).abs() < 0.02,
            "rotation = {}, expected {theta}",
            fit.rotation
        );
    }

    #[test]
    fn major_axis_reported_first() {
        // Generator's "a" smaller than "b": the fit must still report the
        // larger semi-axis first.
        let points = ellipse_samples(0.0, 0.0, 10.0, 30.0, 0.0, 64);
        let fit = fit_ellipse(&points).unwrap();
        assert!(fit.axes.0 >= fit.axes.1);
        assert!((fit.axes.0 - 30.0).abs() < 0.2);
    }

    #[test]
    fn area_matches_generator() {
        let points = ellipse_samples(0.0, 0.0, 22.0, 14.0, 1.0, 64);
        let fit = fit_ellipse(&points).unwrap();
        let truth = std::f64::consts::PI * 22.0 * 14.0;
        assert!(
            (fit.area() - truth).abs() / truth < 0.01,
            "area {} vs {truth}",
            fit.area()
        );
    }

    #[test]
    fn noisy_samples_still_fit() {
        // Deterministic pseudo-noise, ±0.3 px.
        let mut points = ellipse_samples(60.0, 60.0, 30.0, 18.0, 0.3, 96);
        for (i, p) in points.iter_mut().enumerate() {
            let jitter = f64::from(u32::try_from(i * 2654_435_761 % 1000).unwrap_or(0)) / 1000.0;
            p.x += (jitter - 0.5) * 0.6;
            p.y += (0.5 - jitter) * 0.6;
        }
        let fit = fit_ellipse(&points).unwrap();
        assert!((fit.axes.0 - 30.0).abs() < 1.0);
        assert!((fit.axes.1 - 18.0).abs() < 1.0);
    }
}
