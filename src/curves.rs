//! Stroke and boundary curve extraction.

use imageproc::contours::{BorderType, find_contours};
use imageproc::edges::canny;
use imageproc::geometry::{approximate_polygon_dp, arc_length, contour_area};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::CurveConfig;
use crate::pixel::PixelField;

/// Ordered polyline of integer pixel points, always at least two long.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<(i32, i32)>", into = "Vec<(i32, i32)>")]
pub struct Curve {
    points: Vec<(i32, i32)>,
}

impl Curve {
    /// Returns `None` for degenerate inputs with fewer than two points.
    pub fn new(points: Vec<(i32, i32)>) -> Option<Self> {
        (points.len() >= 2).then_some(Self { points })
    }

    pub fn points(&self) -> &[(i32, i32)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start(&self) -> (i32, i32) {
        self.points[0]
    }

    pub fn end(&self) -> (i32, i32) {
        self.points[self.points.len() - 1]
    }

    pub fn is_closed(&self) -> bool {
        self.start() == self.end()
    }
}

impl TryFrom<Vec<(i32, i32)>> for Curve {
    type Error = String;

    fn try_from(points: Vec<(i32, i32)>) -> Result<Self, Self::Error> {
        let n = points.len();
        Curve::new(points).ok_or_else(|| format!("curve needs at least 2 points, got {n}"))
    }
}

impl From<Curve> for Vec<(i32, i32)> {
    fn from(curve: Curve) -> Self {
        curve.points
    }
}

/// Trace outer edge boundaries and simplify them into polylines.
pub fn extract_curves(field: &PixelField, config: &CurveConfig) -> Vec<Curve> {
    if field.is_empty() {
        return Vec::new();
    }

    let edges = canny(&field.to_gray_image(), config.canny_low, config.canny_high);
    let contours = find_contours::<i32>(&edges);
    let traced = contours.len();

    let curves: Vec<Curve> = contours
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter(|c| contour_area(&c.points) > config.min_area)
        .filter_map(|c| {
            let epsilon = config.epsilon_ratio * arc_length(&c.points, true);
            let simplified = if epsilon > 0.0 {
                approximate_polygon_dp(&c.points, epsilon, true)
            } else {
                c.points
            };
            Curve::new(simplified.into_iter().map(|p| (p.x, p.y)).collect())
        })
        .collect();

    debug!("extract_curves: {} contours traced, {} kept", traced, curves.len());
    curves
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use imageproc::drawing::draw_filled_circle_mut;

    #[test]
    fn degenerate_curves_are_rejected() {
        assert!(Curve::new(vec![(1, 1)]).is_none());
        assert!(Curve::new(vec![]).is_none());
        let c = Curve::new(vec![(0, 0), (3, 4)]).unwrap();
        assert_eq!(c.start(), (0, 0));
        assert_eq!(c.end(), (3, 4));
        assert!(!c.is_closed());
    }

    #[test]
    fn blank_field_has_no_curves() {
        let field = PixelField::from_gray(50, 40, vec![255; 2000]).unwrap();
        assert!(extract_curves(&field, &CurveConfig::default()).is_empty());
    }

    #[test]
    fn large_disk_outline_becomes_one_polyline() {
        let mut img = GrayImage::from_pixel(120, 120, Luma([255]));
        draw_filled_circle_mut(&mut img, (60, 60), 30, Luma([0]));
        let field = PixelField::from_gray(120, 120, img.into_raw()).unwrap();
        let curves = extract_curves(&field, &CurveConfig::default());
        assert!(!curves.is_empty());
        for c in &curves {
            assert!(c.len() >= 2);
            for &(x, y) in c.points() {
                assert!((20..=100).contains(&x) && (20..=100).contains(&y), "({x},{y})");
            }
        }
    }

    #[test]
    fn contours_below_min_area_are_dropped() {
        let mut img = GrayImage::from_pixel(120, 120, Luma([255]));
        draw_filled_circle_mut(&mut img, (60, 60), 30, Luma([0]));
        let field = PixelField::from_gray(120, 120, img.into_raw()).unwrap();
        assert!(!extract_curves(&field, &CurveConfig::default()).is_empty());

        let strict = CurveConfig {
            min_area: 120.0 * 120.0,
            ..CurveConfig::default()
        };
        assert!(extract_curves(&field, &strict).is_empty());
    }

    #[test]
    fn curve_json_is_a_point_list() {
        let c = Curve::new(vec![(1, 2), (3, 4)]).unwrap();
        assert_eq!(serde_json::to_string(&c).unwrap(), "[[1,2],[3,4]]");
        let bad: Result<Curve, _> = serde_json::from_str("[[1,2]]");
        assert!(bad.is_err());
    }
}
