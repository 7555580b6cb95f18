//! Tunable thresholds for every pipeline stage.
//!
//! All structs deserialize with `#[serde(default)]`, so a JSON file only has
//! to name the fields it overrides:
//!
//! ```json
//! { "dots": { "accumulator_threshold": 20 }, "symmetry": { "tolerance": 12.0 } }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::KolamError;

const BLUR_KERNEL_SIZE: usize = 9;
const BLUR_SIGMA: f32 = 2.0;
const DOT_CANNY_HIGH: f32 = 50.0;
const ACCUMULATOR_THRESHOLD: u32 = 30;
const MIN_DOT_DISTANCE: f32 = 20.0;
const MIN_DOT_RADIUS: u32 = 3;
const MAX_DOT_RADIUS: u32 = 15;
const MIN_CIRCLE_SUPPORT: f32 = 0.5;
const MIN_ARC_COVERAGE: f32 = 0.8;

const CURVE_CANNY_LOW: f32 = 50.0;
const CURVE_CANNY_HIGH: f32 = 150.0;
const MIN_CONTOUR_AREA: f64 = 50.0;
const EPSILON_RATIO: f64 = 0.02;

const SQUARE_MAX_STD: f64 = 10.0;
const DIAMOND_MAX_STD: f64 = 25.0;
const DEFAULT_GRID_SIZE: u32 = 7;
const MIN_GRID_SIZE: u32 = 3;
const MAX_GRID_SIZE: u32 = 15;

const SYMMETRY_TOLERANCE: f64 = 30.0;

const CANVAS_SIZE: u32 = 400;
const DOT_MARKER_RADIUS: u32 = 3;
const CONFIDENCE: f64 = 0.85;

/// Configuration for the whole analysis pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KolamConfig {
    pub dots: DotConfig,
    pub curves: CurveConfig,
    pub grid: GridConfig,
    pub symmetry: SymmetryConfig,
    pub connectivity: ConnectivityConfig,
    pub reconstruct: ReconstructConfig,
}

/// Gradient Hough circle detection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DotConfig {
    /// Width of the Gaussian smoothing kernel; even values are bumped to the next odd size.
    pub blur_kernel_size: usize,
    pub blur_sigma: f32,
    /// Upper Canny threshold; the lower one is half of it.
    pub canny_high: f32,
    /// Minimum 3x3-window vote count for a center candidate.
    pub accumulator_threshold: u32,
    /// Minimum distance between accepted centers, in pixels.
    pub min_dist: f32,
    pub min_radius: u32,
    pub max_radius: u32,
    /// Edge pixels within one pixel of the fitted radius, as a fraction of
    /// the circumference `2 * pi * r`, needed to keep a center.
    pub min_circle_support: f32,
    /// Fraction of angular sectors around a center that must hold a
    /// supporting edge pixel. Stroke ends and corners cover only part of
    /// the ring.
    pub min_arc_coverage: f32,
}

impl Default for DotConfig {
    fn default() -> Self {
        Self {
            blur_kernel_size: BLUR_KERNEL_SIZE,
            blur_sigma: BLUR_SIGMA,
            canny_high: DOT_CANNY_HIGH,
            accumulator_threshold: ACCUMULATOR_THRESHOLD,
            min_dist: MIN_DOT_DISTANCE,
            min_radius: MIN_DOT_RADIUS,
            max_radius: MAX_DOT_RADIUS,
            min_circle_support: MIN_CIRCLE_SUPPORT,
            min_arc_coverage: MIN_ARC_COVERAGE,
        }
    }
}

/// Edge, contour and polygon simplification parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveConfig {
    pub canny_low: f32,
    pub canny_high: f32,
    /// Contours enclosing this area or less are dropped as noise.
    pub min_area: f64,
    /// Simplification tolerance as a fraction of the contour perimeter.
    pub epsilon_ratio: f64,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            canny_low: CURVE_CANNY_LOW,
            canny_high: CURVE_CANNY_HIGH,
            min_area: MIN_CONTOUR_AREA,
            epsilon_ratio: EPSILON_RATIO,
        }
    }
}

/// Which distance population the grid classifier measures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceSpread {
    /// Spread of each dot's nearest-neighbour distance.
    #[default]
    NearestNeighbour,
    /// Spread of every pairwise distance.
    AllPairs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub spread: DistanceSpread,
    pub square_max_std: f64,
    pub diamond_max_std: f64,
    /// Size reported when no dots were detected.
    pub default_size: u32,
    pub min_size: u32,
    pub max_size: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            spread: DistanceSpread::default(),
            square_max_std: SQUARE_MAX_STD,
            diamond_max_std: DIAMOND_MAX_STD,
            default_size: DEFAULT_GRID_SIZE,
            min_size: MIN_GRID_SIZE,
            max_size: MAX_GRID_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymmetryConfig {
    /// Mean absolute intensity difference below which two regions match.
    pub tolerance: f64,
}

impl Default for SymmetryConfig {
    fn default() -> Self {
        Self {
            tolerance: SYMMETRY_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// Endpoint quantization step in pixels. `1` keys nodes by exact pixel.
    pub endpoint_quantum: u32,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            endpoint_quantum: 1,
        }
    }
}

/// Canonical scene layout and styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructConfig {
    pub canvas_size: u32,
    pub dot_radius: u32,
    pub background: String,
    pub brush: String,
    pub stroke_width: f32,
    pub confidence: f64,
}

impl Default for ReconstructConfig {
    fn default() -> Self {
        Self {
            canvas_size: CANVAS_SIZE,
            dot_radius: DOT_MARKER_RADIUS,
            background: "#fef3c7".to_string(),
            brush: "#92400e".to_string(),
            stroke_width: 2.0,
            confidence: CONFIDENCE,
        }
    }
}

/// Read a JSON config file. Missing fields fall back to their defaults.
pub fn load_config(path: &Path) -> Result<KolamConfig, KolamError> {
    let data = fs::read_to_string(path)
        .map_err(|e| KolamError::Config(format!("failed to read {}: {e}", path.display())))?;
    parse_config(&data)
        .map_err(|e| KolamError::Config(format!("failed to parse {}: {e}", path.display())))
}

pub fn parse_config(data: &str) -> Result<KolamConfig, serde_json::Error> {
    serde_json::from_str(data)
}
