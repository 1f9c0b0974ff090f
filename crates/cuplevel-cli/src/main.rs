//! Estimate how full a cup or glass is from a photograph.
//!
//! Reads an image file, runs the estimation pipeline, and prints the fill
//! percentage (or a JSON report). Optionally writes an annotated copy of
//! the image with the detected rim and surface drawn in.
//!
//! "Not found" outcomes are results, not failures: the process exits
//! zero for them and reserves nonzero exits for I/O, decode, and
//! configuration errors.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use cuplevel_pipeline::{
    FillLevel, PipelineConfig, ShapeModel, SmoothingFilter, estimate_staged,
};

/// Estimate the fill level of a cup or glass from a single photograph.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Input image path (PNG, JPEG, BMP, WebP).
    input: PathBuf,

    /// Write an annotated copy of the image here (PNG recommended).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the full report as JSON instead of a summary line.
    #[arg(long)]
    json: bool,

    /// Container shape model.
    #[arg(long, value_enum, default_value_t = Model::Circle)]
    model: Model,

    /// Gaussian smoothing sigma (ignored when --median is set).
    #[arg(long, default_value_t = 1.4)]
    blur_sigma: f32,

    /// Use a median filter with this radius instead of Gaussian smoothing.
    #[arg(long, value_name = "RADIUS")]
    median: Option<u32>,

    /// Canny low threshold.
    #[arg(long, default_value_t = 50.0)]
    canny_low: f32,

    /// Canny high threshold.
    #[arg(long, default_value_t = 150.0)]
    canny_high: f32,

    /// Minimum enclosed area (pixels^2) for ellipse/polygon candidates.
    #[arg(long, default_value_t = 500.0)]
    min_area: f64,

    /// Smallest circle radius considered, in pixels.
    #[arg(long, default_value_t = 10)]
    min_radius: u32,

    /// Largest circle radius considered, in pixels.
    #[arg(long, default_value_t = 300)]
    max_radius: u32,

    /// Minimum accumulator votes for a circle candidate.
    #[arg(long, default_value_t = 30)]
    votes: u32,

    /// Fraction of container height skipped below the rim (0 to 1).
    #[arg(long, default_value_t = 0.15)]
    margin: f64,

    /// Intensity below which a pixel counts as liquid (0-255).
    #[arg(long, default_value_t = 100)]
    darkness_threshold: u8,

    /// Minimum liquid fraction for a row to count as the surface (0 to 1).
    #[arg(long, default_value_t = 0.25)]
    coverage: f64,
}

/// CLI-facing shape model names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Model {
    Circle,
    Ellipse,
    Polygon,
}

impl From<Model> for ShapeModel {
    fn from(model: Model) -> Self {
        match model {
            Model::Circle => Self::Circle,
            Model::Ellipse => Self::Ellipse,
            Model::Polygon => Self::Polygon,
        }
    }
}

impl Args {
    fn pipeline_config(&self) -> PipelineConfig {
        let smoothing = self.median.map_or(
            SmoothingFilter::Gaussian {
                sigma: self.blur_sigma,
            },
            |radius| SmoothingFilter::Median { radius },
        );
        PipelineConfig {
            smoothing,
            shape_model: self.model.into(),
            canny_low: self.canny_low,
            canny_high: self.canny_high,
            min_area: self.min_area,
            min_radius: self.min_radius,
            max_radius: self.max_radius,
            accumulator_threshold: self.votes,
            margin_fraction: self.margin,
            darkness_threshold: self.darkness_threshold,
            coverage_fraction: self.coverage,
            ..PipelineConfig::default()
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let bytes = std::fs::read(&args.input)
        .map_err(|e| format!("cannot read {}: {e}", args.input.display()))?;

    let config = args.pipeline_config();
    let staged = estimate_staged(&bytes, &config).map_err(|e| e.to_string())?;
    let report = &staged.report;

    if args.json {
        let json = serde_json::to_string_pretty(report).map_err(|e| e.to_string())?;
        println!("{json}");
    } else if report.shape.is_none() {
        println!("Container not found");
    } else {
        match report.level {
            FillLevel::Percent(pct) => println!("Fill level: {pct:.1}%"),
            FillLevel::Undetermined => {
                println!("Fill level: undetermined (no liquid surface detected)");
            }
        }
    }

    if let Some(output) = &args.output {
        let original = image::load_from_memory(&bytes)
            .map_err(|e| format!("cannot decode {}: {e}", args.input.display()))?
            .to_rgba8();
        let annotated = cuplevel_annotate::annotate(&original, report);
        annotated
            .save(output)
            .map_err(|e| format!("cannot write {}: {e}", output.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_maps_to_pipeline_shape_model() {
        assert_eq!(ShapeModel::from(Model::Circle), ShapeModel::Circle);
        assert_eq!(ShapeModel::from(Model::Ellipse), ShapeModel::Ellipse);
        assert_eq!(ShapeModel::from(Model::Polygon), ShapeModel::Polygon);
    }

    #[test]
    fn default_args_build_default_config() {
        let args = Args::parse_from(["cuplevel", "photo.png"]);
        assert_eq!(args.pipeline_config(), PipelineConfig::default());
    }

    #[test]
    fn median_flag_switches_smoothing_filter() {
        let args = Args::parse_from(["cuplevel", "photo.png", "--median", "2"]);
        assert_eq!(
            args.pipeline_config().smoothing,
            SmoothingFilter::Median { radius: 2 }
        );
    }

    #[test]
    fn tunables_flow_into_config() {
        let args = Args::parse_from([
            "cuplevel",
            "photo.png",
            "--model",
            "ellipse",
            "--darkness-threshold",
            "80",
            "--coverage",
            "0.3",
        ]);
        let config = args.pipeline_config();
        assert_eq!(config.shape_model, ShapeModel::Ellipse);
        assert_eq!(config.darkness_threshold, 80);
        assert!((config.coverage_fraction - 0.3).abs() < f64::EPSILON);
    }
}
