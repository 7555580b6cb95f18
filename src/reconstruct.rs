//! Vector reconstruction: unit-square patterns, a symbolic rule set and a
//! canonical SVG scene.

use serde::{Deserialize, Serialize};

use crate::config::ReconstructConfig;
use crate::curves::Curve;
use crate::dots::Dot;
use crate::style::StyleLabel;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

/// One curve mapped into `[0, 1]^2` by its own bounding box.
///
/// The two connection flags are a point-count heuristic for rule-based
/// renderers, not measured stroke directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedPattern {
    pub id: usize,
    pub points: Vec<NormalizedPoint>,
    pub has_down_connection: bool,
    pub has_right_connection: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub grid_size: u32,
    pub patterns: Vec<NormalizedPattern>,
    pub symmetry_type: String,
    pub cultural_type: StyleLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconstructionRecord {
    pub svg: String,
    pub rule_set: RuleSet,
    pub confidence: f64,
}

/// Map a curve into its own unit square: `(p - min) / max(1, max - min)` per axis.
pub fn normalize_curve(curve: &Curve) -> Vec<NormalizedPoint> {
    let pts = curve.points();
    let (min_x, max_x) = extent(pts.iter().map(|p| p.0));
    let (min_y, max_y) = extent(pts.iter().map(|p| p.1));
    let span_x = (max_x - min_x).max(1) as f64;
    let span_y = (max_y - min_y).max(1) as f64;
    pts.iter()
        .map(|&(x, y)| NormalizedPoint {
            x: (x - min_x) as f64 / span_x,
            y: (y - min_y) as f64 / span_y,
        })
        .collect()
}

fn extent(values: impl Iterator<Item = i32>) -> (i32, i32) {
    values.fold((i32::MAX, i32::MIN), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

/// Heuristic: more than three points "extends downward".
pub fn heuristic_down_connection(point_count: usize) -> bool {
    point_count > 3
}

/// Heuristic: more than two points "extends rightward".
pub fn heuristic_right_connection(point_count: usize) -> bool {
    point_count > 2
}

pub fn normalize_patterns(curves: &[Curve]) -> Vec<NormalizedPattern> {
    curves
        .iter()
        .enumerate()
        .map(|(i, curve)| {
            let points = normalize_curve(curve);
            NormalizedPattern {
                id: i + 1,
                has_down_connection: heuristic_down_connection(points.len()),
                has_right_connection: heuristic_right_connection(points.len()),
                points,
            }
        })
        .collect()
}

/// Affine pixel -> canvas mapping `coord / source * canvas`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasTransform {
    pub scale_x: f64,
    pub scale_y: f64,
}

impl CanvasTransform {
    pub fn new(source_width: usize, source_height: usize, canvas_size: u32) -> Self {
        let scale = |dim: usize| {
            if dim == 0 {
                0.0
            } else {
                canvas_size as f64 / dim as f64
            }
        };
        Self {
            scale_x: scale(source_width),
            scale_y: scale(source_height),
        }
    }

    pub fn apply(&self, (x, y): (i32, i32)) -> (f64, f64) {
        (x as f64 * self.scale_x, y as f64 * self.scale_y)
    }
}

/// Render dots as fixed-radius circles and curves as polylines on the canonical canvas.
pub fn render_svg(
    dots: &[Dot],
    curves: &[Curve],
    source_width: usize,
    source_height: usize,
    config: &ReconstructConfig,
) -> String {
    let size = config.canvas_size;
    let tf = CanvasTransform::new(source_width, source_height, size);
    let mut svg = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<svg width="{size}" height="{size}" viewBox="0 0 {size} {size}" xmlns="http://www.w3.org/2000/svg" style="background-color: {bg};">
    <defs>
        <style>
            .kolam-curve {{ fill: none; stroke: {brush}; stroke-width: {stroke}; stroke-linecap: round; stroke-linejoin: round; }}
            .kolam-dot {{ fill: {brush}; }}
        </style>
    </defs>"#,
        bg = config.background,
        brush = config.brush,
        stroke = config.stroke_width,
    );

    for dot in dots {
        let (cx, cy) = tf.apply((dot.x, dot.y));
        svg.push_str(&format!(
            "\n    <circle class=\"kolam-dot\" cx=\"{cx:.2}\" cy=\"{cy:.2}\" r=\"{}\"/>",
            config.dot_radius
        ));
    }

    for curve in curves {
        let points: Vec<String> = curve
            .points()
            .iter()
            .map(|&p| {
                let (x, y) = tf.apply(p);
                format!("{x:.2},{y:.2}")
            })
            .collect();
        svg.push_str(&format!(
            "\n    <polyline class=\"kolam-curve\" points=\"{}\"/>",
            points.join(" ")
        ));
    }

    svg.push_str("\n</svg>\n");
    svg
}

/// Build the full reconstruction record from detector output.
pub fn reconstruct(
    dots: &[Dot],
    curves: &[Curve],
    source_width: usize,
    source_height: usize,
    grid_size: u32,
    style: StyleLabel,
    config: &ReconstructConfig,
) -> ReconstructionRecord {
    ReconstructionRecord {
        svg: render_svg(dots, curves, source_width, source_height, config),
        rule_set: RuleSet {
            grid_size,
            patterns: normalize_patterns(curves),
            symmetry_type: "1D".to_string(),
            cultural_type: style,
        },
        confidence: config.confidence,
    }
}
