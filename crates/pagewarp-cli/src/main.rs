//! pagewarp: CLI front end for the document scanning pipeline.
//!
//! Loads a photograph, detects (or accepts) the page boundary, rectifies
//! the perspective, and writes the flattened color raster plus an
//! optional binarized "scan" raster.
//!
//! # Usage
//!
//! ```text
//! pagewarp photo.jpg -o page.png --bw page-bw.png
//! pagewarp photo.jpg -o page.png --corners "102,98;897,121;881,903;118,879"
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use pagewarp_pipeline::{DetectionKind, Point, Quad, RectifyPolicy, ScanConfig, ScanError};

/// Document scanner: detect, rectify, and binarize a photographed page.
#[derive(Parser)]
#[command(name = "pagewarp", version)]
struct Cli {
    /// Path to the input photograph (PNG, JPEG, BMP, WebP).
    input: PathBuf,

    /// Path for the rectified color output.
    #[arg(short, long)]
    output: PathBuf,

    /// Also write the binarized scan raster to this path.
    #[arg(long)]
    bw: Option<PathBuf>,

    /// Manual corner override, skipping detection.
    ///
    /// Four "x,y" pairs separated by semicolons, in any order, e.g.
    /// "102,98;897,121;881,903;118,879".
    #[arg(long, value_parser = parse_corners)]
    corners: Option<Quad>,

    /// Output canvas sizing.
    #[arg(long, value_enum, default_value_t = Sizing::Fixed)]
    size: Sizing,

    /// Output height in pixels (fixed sizing only).
    #[arg(long, default_value_t = RectifyPolicy::DEFAULT_TARGET_HEIGHT, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    height: u32,

    /// Output width/height aspect ratio (fixed sizing only).
    #[arg(long, default_value_t = RectifyPolicy::DEFAULT_ASPECT_RATIO)]
    ratio: f64,

    /// Minimum candidate contour area in square pixels.
    #[arg(long, default_value_t = ScanConfig::DEFAULT_MIN_CONTOUR_AREA)]
    min_area: f64,

    /// Polygon approximation tolerance as a fraction of perimeter.
    #[arg(long, default_value_t = ScanConfig::DEFAULT_APPROX_EPSILON_FRAC)]
    epsilon: f64,

    /// Adaptive threshold neighborhood size in pixels (odd).
    #[arg(long, default_value_t = ScanConfig::DEFAULT_THRESHOLD_BLOCK_SIZE)]
    block_size: u32,

    /// Adaptive threshold bias subtracted from the local mean.
    #[arg(long, default_value_t = ScanConfig::DEFAULT_THRESHOLD_BIAS)]
    bias: i16,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// The JSON must be a valid `ScanConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Output canvas sizing selection.
#[derive(Clone, Copy, ValueEnum)]
enum Sizing {
    /// Fixed aspect ratio and height (defaults to portrait A-series).
    Fixed,
    /// Derive width and height from the detected quad's edge lengths.
    Derived,
}

/// Parse four "x,y" pairs separated by semicolons into a [`Quad`].
fn parse_corners(s: &str) -> Result<Quad, String> {
    let pairs: Vec<&str> = s.split(';').collect();
    if pairs.len() != 4 {
        return Err(format!("expected 4 corners, got {}", pairs.len()));
    }
    let mut points = [Point::new(0.0, 0.0); 4];
    for (slot, pair) in points.iter_mut().zip(&pairs) {
        let (x, y) = pair
            .split_once(',')
            .ok_or_else(|| format!("corner {pair:?} is not an \"x,y\" pair"))?;
        let x: f64 = x
            .trim()
            .parse()
            .map_err(|e| format!("corner {pair:?}: {e}"))?;
        let y: f64 = y
            .trim()
            .parse()
            .map_err(|e| format!("corner {pair:?}: {e}"))?;
        *slot = Point::new(x, y);
    }
    Ok(Quad::new(points))
}

/// Build a [`ScanConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.  Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<ScanConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(ScanConfig {
        min_contour_area: cli.min_area,
        approx_epsilon_frac: cli.epsilon,
        threshold_block_size: cli.block_size,
        threshold_bias: cli.bias,
        policy: match cli.size {
            Sizing::Fixed => RectifyPolicy::FixedAspect {
                target_height: cli.height,
                aspect_ratio: cli.ratio,
            },
            Sizing::Derived => RectifyPolicy::DerivedFromQuad,
        },
        ..ScanConfig::default()
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image = match image::open(&cli.input) {
        Ok(img) => img.to_rgb8(),
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.input.display());
            return ExitCode::FAILURE;
        }
    };
    eprintln!(
        "Input: {} ({}x{})",
        cli.input.display(),
        image.width(),
        image.height(),
    );

    let result = if let Some(corners) = cli.corners {
        pagewarp_pipeline::scan_with_corners(&image, corners, &config)
    } else {
        pagewarp_pipeline::scan(&image, &config)
    };
    let result = match result {
        Ok(r) => r,
        Err(ScanError::QuadNotFound) => {
            eprintln!("No document boundary found; retry with --corners \"x,y;x,y;x,y;x,y\"");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let [tl, tr, br, bl] = result.corners.points();
    eprintln!(
        "Corners: ({:.1},{:.1}) ({:.1},{:.1}) ({:.1},{:.1}) ({:.1},{:.1})",
        tl.x, tl.y, tr.x, tr.y, br.x, br.y, bl.x, bl.y,
    );
    if result.kind == DetectionKind::MinAreaRect {
        eprintln!(
            "Note: no convex four-corner contour found, used the minimum-area \
             bounding rectangle; check the output and consider --corners"
        );
    }

    if let Err(e) = result.rectified.save(&cli.output) {
        eprintln!("Error writing {}: {e}", cli.output.display());
        return ExitCode::FAILURE;
    }
    eprintln!(
        "Rectified {}x{} written to {}",
        result.rectified.width(),
        result.rectified.height(),
        cli.output.display(),
    );

    if let Some(ref bw_path) = cli.bw {
        if let Err(e) = result.binarized.save(bw_path) {
            eprintln!("Error writing {}: {e}", bw_path.display());
            return ExitCode::FAILURE;
        }
        eprintln!("Binarized scan written to {}", bw_path.display());
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn corners_parse_in_any_whitespace_style() {
        let quad = parse_corners("102,98; 897,121 ;881,903;118, 879").unwrap();
        let points = quad.points();
        assert!((points[0].x - 102.0).abs() < f64::EPSILON);
        assert!((points[3].y - 879.0).abs() < f64::EPSILON);
    }

    #[test]
    fn corners_reject_wrong_count_and_bad_pairs() {
        assert!(parse_corners("1,2;3,4;5,6").is_err());
        assert!(parse_corners("1,2;3,4;5,6;7").is_err());
        assert!(parse_corners("1,2;3,4;5,6;a,b").is_err());
    }

    #[test]
    fn config_json_overrides_flags() {
        let wanted = ScanConfig {
            min_contour_area: 42.0,
            ..ScanConfig::default()
        };
        let mut cli = Cli::parse_from(["pagewarp", "in.png", "-o", "out.png", "--min-area", "7"]);
        cli.config_json = Some(serde_json::to_string(&wanted).unwrap());
        let parsed = config_from_cli(&cli).unwrap();
        assert_eq!(parsed, wanted);
    }

    #[test]
    fn flags_assemble_a_config() {
        let cli = Cli::parse_from([
            "pagewarp", "in.png", "-o", "out.png", "--size", "derived", "--bias", "4",
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.policy, RectifyPolicy::DerivedFromQuad);
        assert_eq!(config.threshold_bias, 4);
    }
}
