//! Shared types for the cuplevel estimation pipeline.

use serde::{Deserialize, Serialize};

use crate::smooth::SmoothingFilter;

/// Re-export `GrayImage` so downstream crates can reference
/// intermediate raster data without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbaImage` so annotation consumers can reference the
/// original decoded image without depending on `image` directly.
pub use image::RgbaImage;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Axis-aligned extent of a container shape, in image coordinates.
///
/// `top`/`bottom` bound the vertical search for the liquid surface;
/// `left`/`right` bound the columns considered in each row. Values are
/// unclipped — they may extend past the image edges for shapes that
/// overhang the frame, and consumers clip to valid bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Extent {
    /// Vertical span in pixels (`bottom - top`).
    #[must_use]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// Best-fit container rim, as one of three interchangeable shape models.
///
/// Invariants: `radius` and both `axes` are positive; a polygon carries at
/// least 3 points. Shapes violating these are degenerate and rasterize to
/// an empty interior mask, which downstream stages report as
/// "surface not found".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContainerShape {
    /// Circular rim from the Hough detector.
    Circle {
        /// Center in image coordinates.
        center: Point,
        /// Radius in pixels.
        radius: f64,
    },
    /// Elliptical rim from the direct least-squares fit.
    Ellipse {
        /// Center in image coordinates.
        center: Point,
        /// Semi-axes `(a, b)` in pixels, `a` along the rotated x axis.
        axes: (f64, f64),
        /// Rotation of the `a` axis from +x, in radians.
        rotation: f64,
    },
    /// General polygonal silhouette (largest closed boundary curve).
    Polygon {
        /// Boundary points in traversal order, not closed.
        points: Vec<Point>,
    },
}

impl ContainerShape {
    /// Axis-aligned extent of the shape in image coordinates.
    ///
    /// For a rotated ellipse the half-extents are
    /// `sqrt((a cos θ)² + (b sin θ)²)` horizontally and
    /// `sqrt((a sin θ)² + (b cos θ)²)` vertically.
    #[must_use]
    pub fn extent(&self) -> Extent {
        match self {
            Self::Circle { center, radius } => Extent {
                top: center.y - radius,
                bottom: center.y + radius,
                left: center.x - radius,
                right: center.x + radius,
            },
            Self::Ellipse {
                center,
                axes: (a, b),
                rotation,
            } => {
                let (sin, cos) = rotation.sin_cos();
                let half_w = (a * cos).hypot(b * sin);
                let half_h = (a * sin).hypot(b * cos);
                Extent {
                    top: center.y - half_h,
                    bottom: center.y + half_h,
                    left: center.x - half_w,
                    right: center.x + half_w,
                }
            }
            Self::Polygon { points } => {
                let mut extent = Extent {
                    top: f64::INFINITY,
                    bottom: f64::NEG_INFINITY,
                    left: f64::INFINITY,
                    right: f64::NEG_INFINITY,
                };
                for p in points {
                    extent.top = extent.top.min(p.y);
                    extent.bottom = extent.bottom.max(p.y);
                    extent.left = extent.left.min(p.x);
                    extent.right = extent.right.max(p.x);
                }
                extent
            }
        }
    }

    /// Whether the shape cannot enclose any interior pixels.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        match self {
            Self::Circle { radius, .. } => *radius <= 0.0,
            Self::Ellipse { axes: (a, b), .. } => *a <= 0.0 || *b <= 0.0,
            Self::Polygon { points } => points.len() < 3,
        }
    }
}

/// Computed fill level.
///
/// A missing liquid surface is reported as [`Undetermined`](Self::Undetermined),
/// a distinct state — never a silent 0%. A 0% reading is a legitimate
/// measurement (detected rim, dry interior) and callers that need a retake
/// prompt must be able to tell the two apart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FillLevel {
    /// Fill percentage in `[0, 100]`.
    Percent(f64),
    /// No liquid surface was found inside the container.
    Undetermined,
}

/// Result of one estimation pass over a single image.
///
/// Detection failures are values, not errors: a missing container is
/// `shape: None`, a missing surface is `surface_row: None`, and both yield
/// [`FillLevel::Undetermined`]. The pipeline returns a report for every
/// decodable image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillReport {
    /// Estimated fill level.
    pub level: FillLevel,
    /// Best-fit container rim, if one cleared the area/vote floor.
    pub shape: Option<ContainerShape>,
    /// Absolute image row of the liquid's top surface, if found.
    pub surface_row: Option<u32>,
    /// Dimensions of the source image in pixels.
    pub dimensions: Dimensions,
}

/// Result of running the pipeline with intermediate rasters preserved.
///
/// Lets front ends display each processing step (and feeds annotation,
/// which needs the geometry alongside the source dimensions).
///
/// Note: does not derive `PartialEq` or serde because `GrayImage` supports
/// neither; only the embedded [`FillReport`] crosses serialization
/// boundaries.
#[derive(Debug, Clone)]
pub struct StagedReport {
    /// Stage 1: decoded grayscale image.
    pub grayscale: GrayImage,
    /// Stage 2: denoised image.
    pub smoothed: GrayImage,
    /// Stage 4: rasterized interior mask (`Some` once a shape is found).
    pub mask: Option<GrayImage>,
    /// Stage 4: grayscale image with everything outside the container zeroed.
    pub masked: Option<GrayImage>,
    /// Final report.
    pub report: FillReport,
}

/// Shape model used by the container locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeModel {
    /// Gradient circular Hough transform.
    #[default]
    Circle,
    /// Closed-curve extraction + direct least-squares ellipse fit.
    Ellipse,
    /// Largest closed boundary curve, kept as a polygon.
    Polygon,
}

/// Configuration for the estimation pipeline.
///
/// One immutable struct passed per call — there is no ambient or global
/// tunable state. All parameters have documented defaults; [`validate`]
/// rejects nonsensical combinations.
///
/// [`validate`]: Self::validate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Denoising filter applied before shape detection.
    pub smoothing: SmoothingFilter,

    /// Which container shape model to use.
    pub shape_model: ShapeModel,

    /// Canny edge detector low threshold. Gradient magnitudes between
    /// `canny_low` and `canny_high` are edges only if connected to a
    /// strong edge. Must not exceed `canny_high`.
    pub canny_low: f32,

    /// Canny edge detector high threshold. Gradient magnitudes above this
    /// are definite edges.
    pub canny_high: f32,

    /// Minimum enclosed area (pixels²) for a closed boundary curve to be
    /// considered a container candidate (ellipse/polygon models).
    pub min_area: f64,

    /// Smallest circle radius the Hough detector reports, in pixels.
    pub min_radius: u32,

    /// Largest circle radius the Hough detector reports, in pixels.
    pub max_radius: u32,

    /// Minimum center-accumulator votes for a Hough circle candidate
    /// (the `param2` analogue). Lower values admit weaker circles.
    pub accumulator_threshold: u32,

    /// Minimum distance in pixels between reported Hough circle centers.
    pub min_center_distance: f64,

    /// Fraction of the container height excluded from the top of the
    /// surface search, suppressing rim-shadow false positives.
    /// Must lie in `[0, 1)`.
    pub margin_fraction: f64,

    /// Intensity below which a pixel is classified as liquid. Assumes an
    /// opaque beverage darker than the empty container — a hard domain
    /// assumption, not auto-calibrated.
    pub darkness_threshold: u8,

    /// Minimum fraction of liquid-classified pixels in a row for that row
    /// to count as the liquid surface. Must lie in `(0, 1]`.
    pub coverage_fraction: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            smoothing: SmoothingFilter::default(),
            shape_model: ShapeModel::default(),
            canny_low: 50.0,
            canny_high: 150.0,
            min_area: 500.0,
            min_radius: 10,
            max_radius: 300,
            accumulator_threshold: 30,
            min_center_distance: 40.0,
            margin_fraction: 0.15,
            darkness_threshold: 100,
            coverage_fraction: 0.25,
        }
    }
}

impl PipelineConfig {
    /// Check the configuration for nonsensical values.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] when `canny_low > canny_high`,
    /// `min_radius` is zero or exceeds `max_radius`, `margin_fraction` is
    /// outside `[0, 1)`, `coverage_fraction` is outside `(0, 1]`, or
    /// `min_area` / `min_center_distance` is negative.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.canny_low > self.canny_high {
            return Err(PipelineError::InvalidConfig(format!(
                "canny_low ({}) exceeds canny_high ({})",
                self.canny_low, self.canny_high
            )));
        }
        if self.min_radius == 0 || self.min_radius > self.max_radius {
            return Err(PipelineError::InvalidConfig(format!(
                "radius bounds [{}, {}] are empty or start at zero",
                self.min_radius, self.max_radius
            )));
        }
        if !(0.0..1.0).contains(&self.margin_fraction) {
            return Err(PipelineError::InvalidConfig(format!(
                "margin_fraction ({}) must lie in [0, 1)",
                self.margin_fraction
            )));
        }
        if self.coverage_fraction <= 0.0 || self.coverage_fraction > 1.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "coverage_fraction ({}) must lie in (0, 1]",
                self.coverage_fraction
            )));
        }
        if self.min_area < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "min_area ({}) must be non-negative",
                self.min_area
            )));
        }
        if self.min_center_distance < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "min_center_distance ({}) must be non-negative",
                self.min_center_distance
            )));
        }
        Ok(())
    }
}

/// Errors that can occur before the pipeline produces a report.
///
/// Detection outcomes (no container, no surface) are *not* errors — they
/// are values inside [`FillReport`]. Only decode and configuration faults
/// surface here.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}
