//! Pipeline orchestration and result assembly.
//!
//! Dot and curve detection run side by side, then the four classifiers run
//! side by side on their outputs. Every stage is a pure function of the
//! field and the config, so two runs on the same input give identical
//! records.

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::config::KolamConfig;
use crate::connectivity::{ConnectivityReport, analyze_connectivity};
use crate::curves::{Curve, extract_curves};
use crate::dots::{Dot, detect_dots};
use crate::error::KolamError;
use crate::grid::{GridProfile, classify_grid};
use crate::pixel::PixelField;
use crate::reconstruct::{ReconstructionRecord, reconstruct};
use crate::style::{StyleLabel, classify_style};
use crate::symmetry::{SymmetryProfile, analyze_symmetry};

/// At most this many curves receive a pattern index.
pub const MAX_MAPPED_CURVES: usize = 16;

/// Raw detector output for one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detections {
    pub dots: Vec<Dot>,
    pub curves: Vec<Curve>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymmetrySummary {
    #[serde(rename = "type")]
    pub kind: String,
    pub details: SymmetryProfile,
}

impl From<SymmetryProfile> for SymmetrySummary {
    fn from(details: SymmetryProfile) -> Self {
        Self {
            kind: details.label().to_string(),
            details,
        }
    }
}

/// Structural description of one kolam image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub grid: String,
    pub kolam_type: StyleLabel,
    pub symmetry: SymmetrySummary,
    pub curves_used: Vec<u8>,
    pub connected: bool,
    pub dots_detected: usize,
    pub curves_detected: usize,
    pub estimated_size: u32,
    pub cultural_notes: String,
}

/// Everything one pipeline run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KolamReport {
    pub analysis: AnalysisRecord,
    pub reconstruction: ReconstructionRecord,
    pub connectivity: ConnectivityReport,
    pub grid_profile: GridProfile,
    pub detections: Detections,
}

/// Run both detectors concurrently on the same field.
pub fn detect(field: &PixelField, config: &KolamConfig) -> Detections {
    if field.is_empty() {
        warn!("detect: empty {}x{} field", field.width(), field.height());
    }
    let (dots, curves) = rayon::join(
        || detect_dots(field, &config.dots),
        || extract_curves(field, &config.curves),
    );
    debug!("detect: {} dots, {} curves", dots.len(), curves.len());
    Detections { dots, curves }
}

/// Heuristic curve -> base pattern index mapping (1..=16) from point counts.
///
/// Simple curves (< 5 points) map to 1, medium ones (< 15) cycle through
/// 2..=9, complex ones through 13..=16. This is a placeholder bucketing, not
/// an adjacency measurement.
pub fn curve_pattern_mapping(curves: &[Curve]) -> Vec<u8> {
    curves
        .iter()
        .take(MAX_MAPPED_CURVES)
        .enumerate()
        .map(|(i, c)| match c.len() {
            n if n < 5 => 1,
            n if n < 15 => ((i % 8) + 2).min(16) as u8,
            _ => ((i % 4) + 13).min(16) as u8,
        })
        .collect()
}

struct Classified {
    grid: GridProfile,
    style: StyleLabel,
    symmetry: SymmetryProfile,
    connectivity: ConnectivityReport,
}

fn classify(field: &PixelField, detections: &Detections, config: &KolamConfig) -> Classified {
    let Detections { dots, curves } = detections;
    let ((grid, style), (symmetry, connectivity)) = rayon::join(
        || {
            (
                classify_grid(dots, &config.grid),
                classify_style(dots.len(), curves.len()),
            )
        },
        || {
            rayon::join(
                || analyze_symmetry(field, &config.symmetry),
                || analyze_connectivity(curves, &config.connectivity),
            )
        },
    );
    Classified {
        grid,
        style,
        symmetry,
        connectivity,
    }
}

fn assemble(detections: &Detections, c: &Classified) -> AnalysisRecord {
    AnalysisRecord {
        grid: c.grid.description(),
        kolam_type: c.style,
        symmetry: c.symmetry.into(),
        curves_used: curve_pattern_mapping(&detections.curves),
        connected: c.connectivity.is_valid(),
        dots_detected: detections.dots.len(),
        curves_detected: detections.curves.len(),
        estimated_size: c.grid.estimated_size,
        cultural_notes: c.style.cultural_note().to_string(),
    }
}

/// Compose the analysis record for already-detected features.
pub fn assemble_analysis(
    field: &PixelField,
    detections: &Detections,
    config: &KolamConfig,
) -> AnalysisRecord {
    assemble(detections, &classify(field, detections, config))
}

pub fn analyze(field: &PixelField, config: &KolamConfig) -> AnalysisRecord {
    assemble_analysis(field, &detect(field, config), config)
}

pub fn reconstruct_field(field: &PixelField, config: &KolamConfig) -> ReconstructionRecord {
    let Detections { dots, curves } = detect(field, config);
    let grid_size = crate::grid::estimate_size(dots.len(), &config.grid);
    let style = classify_style(dots.len(), curves.len());
    reconstruct(
        &dots,
        &curves,
        field.width(),
        field.height(),
        grid_size,
        style,
        &config.reconstruct,
    )
}

/// Detect once and produce both records.
pub fn process(field: &PixelField, config: &KolamConfig) -> KolamReport {
    let detections = detect(field, config);
    let classified = classify(field, &detections, config);
    let analysis = assemble(&detections, &classified);
    let reconstruction = reconstruct(
        &detections.dots,
        &detections.curves,
        field.width(),
        field.height(),
        classified.grid.estimated_size,
        classified.style,
        &config.reconstruct,
    );
    KolamReport {
        analysis,
        reconstruction,
        connectivity: classified.connectivity,
        grid_profile: classified.grid,
        detections,
    }
}

/// Service boundary: run `f`, turning any panic into `AnalysisFailure`.
pub fn run_guarded<T>(stage: &str, f: impl FnOnce() -> T) -> Result<T, KolamError> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let detail = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        error!("{stage} error: {detail}");
        KolamError::AnalysisFailure(format!("{stage} failed: {detail}"))
    })
}

/// Decode encoded image bytes and run the full pipeline behind the failure boundary.
pub fn process_bytes(bytes: &[u8], config: &KolamConfig) -> Result<KolamReport, KolamError> {
    let field = PixelField::decode(bytes)?;
    run_guarded("analysis", || process(&field, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve_of_len(n: usize) -> Curve {
        Curve::new((0..n as i32).map(|i| (i, i * 2)).collect()).unwrap()
    }

    #[test]
    fn mapping_buckets_by_point_count() {
        let curves = vec![curve_of_len(4), curve_of_len(6), curve_of_len(20), curve_of_len(14)];
        assert_eq!(curve_pattern_mapping(&curves), vec![1, 3, 15, 5]);
    }

    #[test]
    fn mapping_is_capped() {
        let curves: Vec<Curve> = (0..40).map(|_| curve_of_len(30)).collect();
        let mapped = curve_pattern_mapping(&curves);
        assert_eq!(mapped.len(), MAX_MAPPED_CURVES);
        assert!(mapped.iter().all(|&m| (13..=16).contains(&m)));
    }

    #[test]
    fn guarded_panic_becomes_analysis_failure() {
        let err = run_guarded("analysis", || -> u32 { panic!("boom") }).unwrap_err();
        match err {
            KolamError::AnalysisFailure(msg) => assert!(msg.contains("boom")),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(run_guarded("analysis", || 5).unwrap(), 5);
    }

    #[test]
    fn undecodable_bytes_are_invalid_input() {
        let err = process_bytes(&[0, 1, 2, 3], &KolamConfig::default()).unwrap_err();
        assert!(matches!(err, KolamError::InvalidInput(_)));
    }

    #[test]
    fn blank_field_gives_empty_but_complete_records() {
        let field = PixelField::from_gray(64, 48, vec![230; 64 * 48]).unwrap();
        let report = process(&field, &KolamConfig::default());
        let a = &report.analysis;
        assert_eq!(a.dots_detected, 0);
        assert_eq!(a.curves_detected, 0);
        assert_eq!(a.grid, "7x7 irregular");
        assert_eq!(a.kolam_type, StyleLabel::Chuzhi);
        assert!(!a.connected);
        assert!(a.curves_used.is_empty());
        assert_eq!(a.symmetry.kind, "4-fold rotational");
        assert!(report.reconstruction.rule_set.patterns.is_empty());
    }
}
