//! Fill percentage from the surface position.
//!
//! Maps the surface row within the container's vertical extent to
//! `[0, 100]`: a surface at the container top is 100%, at the bottom 0%.

use crate::types::FillLevel;

/// Compute the fill percentage for a surface at `surface_row` within a
/// container spanning `[top, bottom]`.
///
/// `100 * (1 - (surface_row - top) / (bottom - top))`, clamped to
/// `[0, 100]`. A non-positive container height is degenerate and reports
/// 0% (such shapes never reach this stage in the pipeline, which drops
/// them at the mask).
#[must_use]
pub fn fill_percentage(surface_row: f64, top: f64, bottom: f64) -> f64 {
    let height = bottom - top;
    if height <= 0.0 {
        return 0.0;
    }
    (100.0 * (1.0 - (surface_row - top) / height)).clamp(0.0, 100.0)
}

/// Lift an optional surface row into a [`FillLevel`].
///
/// A missing surface is [`FillLevel::Undetermined`] — the explicit policy
/// choice over silently reporting 0%.
#[must_use]
pub fn fill_level(surface_row: Option<u32>, top: f64, bottom: f64) -> FillLevel {
    surface_row.map_or(FillLevel::Undetermined, |row| {
        FillLevel::Percent(fill_percentage(f64::from(row), top, bottom))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_scenario_is_half_full() {
        // Container top at row 100, bottom at 500, surface at 300.
        let pct = fill_percentage(300.0, 100.0, 500.0);
        assert!((pct - 50.0).abs() < f64::EPSILON, "got {pct}");
    }

    #[test]
    fn surface_at_top_is_full() {
        assert!((fill_percentage(100.0, 100.0, 500.0) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn surface_at_bottom_is_empty() {
        assert!(fill_percentage(500.0, 100.0, 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn clamps_above_range() {
        // Surface above the container top (possible with a clipped mask).
        assert!((fill_percentage(50.0, 100.0, 500.0) - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn clamps_below_range() {
        assert!(fill_percentage(600.0, 100.0, 500.0).abs() < f64::EPSILON);
    }

    #[test]
    fn monotone_in_surface_row() {
        let mut previous = f64::INFINITY;
        for row in (100..=500).step_by(25) {
            let pct = fill_percentage(f64::from(row), 100.0, 500.0);
            assert!(
                pct <= previous,
                "percentage rose from {previous} to {pct} as the surface dropped"
            );
            previous = pct;
        }
    }

    #[test]
    fn degenerate_extent_reports_zero() {
        assert!(fill_percentage(100.0, 100.0, 100.0).abs() < f64::EPSILON);
        assert!(fill_percentage(100.0, 200.0, 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_surface_is_undetermined() {
        assert_eq!(fill_level(None, 100.0, 500.0), FillLevel::Undetermined);
    }

    #[test]
    fn present_surface_is_percent() {
        assert_eq!(
            fill_level(Some(300), 100.0, 500.0),
            FillLevel::Percent(50.0)
        );
    }
}
