//! cuplevel-pipeline: liquid-level estimation from a single photograph
//! (sans-IO).
//!
//! Estimates how full a cup or glass is through:
//! grayscale -> denoise -> container location -> interior masking ->
//! surface scan -> fill percentage.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and pixel buffers and returns structured data. File and
//! terminal interaction live in `cuplevel-cli`, drawing in
//! `cuplevel-annotate`.
//!
//! One invocation processes one image, synchronously, with no state
//! shared across calls: identical input and configuration yield
//! bit-identical reports.

pub mod conic;
pub mod contour;
pub mod edge;
pub mod grayscale;
pub mod hough;
pub mod level;
pub mod locate;
pub mod mask;
pub mod smooth;
pub mod surface;
pub mod types;

pub use smooth::SmoothingFilter;
pub use types::{
    ContainerShape, Dimensions, Extent, FillLevel, FillReport, PipelineConfig, PipelineError,
    Point, ShapeModel, StagedReport,
};

use image::GrayImage;
use surface::SurfaceParams;

/// Run the full estimation pipeline on raw image bytes.
///
/// Takes encoded image data (PNG, JPEG, BMP, WebP) and a configuration,
/// and produces a [`FillReport`]. Detection failures are values inside the
/// report — a decodable image always yields `Ok`.
///
/// # Pipeline steps
///
/// 1. Decode and convert to grayscale
/// 2. Denoise (Gaussian or median)
/// 3. Locate the container rim (circle / ellipse / polygon model)
/// 4. Rasterize the interior mask and cut the image to it
/// 5. Scan for the liquid surface below the rim margin
/// 6. Convert the surface position to a fill percentage
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `image_bytes` is empty,
/// [`PipelineError::ImageDecode`] if the format is unrecognized, and
/// [`PipelineError::InvalidConfig`] if the configuration fails validation.
pub fn estimate(image_bytes: &[u8], config: &PipelineConfig) -> Result<FillReport, PipelineError> {
    estimate_staged(image_bytes, config).map(|staged| staged.report)
}

/// Run the pipeline, preserving intermediate rasters for inspection.
///
/// Same contract as [`estimate`], but the result additionally carries the
/// grayscale, denoised, mask, and masked images for each stage.
///
/// # Errors
///
/// See [`estimate`].
pub fn estimate_staged(
    image_bytes: &[u8],
    config: &PipelineConfig,
) -> Result<StagedReport, PipelineError> {
    config.validate()?;

    // 1. Decode and convert to grayscale.
    let gray = grayscale::decode_and_grayscale(image_bytes)?;
    let staged = estimate_gray(&gray, config);
    Ok(staged)
}

/// Run the pipeline on an already-decoded grayscale intensity grid.
///
/// The core contract from the caller's side: a rectangular grid of 0–255
/// samples in, a report out. Configuration is assumed valid (use
/// [`PipelineConfig::validate`] when it comes from untrusted input).
#[must_use = "returns the staged report"]
pub fn estimate_gray(gray: &GrayImage, config: &PipelineConfig) -> StagedReport {
    let dimensions = Dimensions {
        width: gray.width(),
        height: gray.height(),
    };

    // 2. Denoise.
    let smoothed = smooth::smooth(gray, config.smoothing);

    // 3. Locate the container rim.
    let Some(shape) = locate::locate(&smoothed, config) else {
        return StagedReport {
            grayscale: gray.clone(),
            smoothed,
            mask: None,
            masked: None,
            report: FillReport {
                level: FillLevel::Undetermined,
                shape: None,
                surface_row: None,
                dimensions,
            },
        };
    };

    // 4. Interior mask, applied to the denoised image.
    let interior = mask::interior_mask(&shape, gray.width(), gray.height());
    let masked = mask::apply_mask(&smoothed, &interior);

    // 5. Surface scan.
    let surface_row = surface::find_surface(
        &masked,
        &interior,
        &shape,
        &SurfaceParams {
            margin_fraction: config.margin_fraction,
            darkness_threshold: config.darkness_threshold,
            coverage_fraction: config.coverage_fraction,
        },
    );

    // 6. Fill percentage.
    let extent = shape.extent();
    let level = level::fill_level(surface_row, extent.top, extent.bottom);

    StagedReport {
        grayscale: gray.clone(),
        smoothed,
        mask: Some(interior),
        masked: Some(masked),
        report: FillReport {
            level,
            shape: Some(shape),
            surface_row,
            dimensions,
        },
    }
}
