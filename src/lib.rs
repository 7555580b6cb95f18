//! Kolam image analysis and vector reconstruction.
//!
//! ```no_run
//! use kolam_reader::{KolamConfig, PixelField, process};
//!
//! # fn main() -> Result<(), kolam_reader::KolamError> {
//! let img = image::open("kolam.png").map_err(|e| kolam_reader::KolamError::InvalidInput(e.to_string()))?;
//! let field = PixelField::from_image(&img)?;
//! let report = process(&field, &KolamConfig::default());
//! println!("{} / {}", report.analysis.grid, report.analysis.kolam_type);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod connectivity;
pub mod curves;
pub mod dots;
pub mod error;
pub mod grid;
pub mod pixel;
pub mod preview;
pub mod reconstruct;
pub mod style;
pub mod symmetry;

pub use crate::analysis::{
    AnalysisRecord, Detections, KolamReport, analyze, detect, process, process_bytes,
    reconstruct_field, run_guarded,
};
pub use crate::config::{KolamConfig, load_config};
pub use crate::connectivity::{ConnectivityReport, EulerKind};
pub use crate::curves::Curve;
pub use crate::dots::Dot;
pub use crate::error::KolamError;
pub use crate::grid::{GridProfile, GridType};
pub use crate::pixel::PixelField;
pub use crate::reconstruct::{NormalizedPattern, ReconstructionRecord, RuleSet};
pub use crate::style::StyleLabel;
pub use crate::symmetry::SymmetryProfile;
