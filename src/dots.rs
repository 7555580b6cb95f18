//! Dot marker detection with a gradient Hough transform.
//!
//! Every Canny edge pixel casts votes along its gradient (both directions)
//! for each radius in the configured band. Centers are local maxima of the
//! 3x3-summed accumulator, accepted strongest-first subject to a minimum
//! spacing. Each candidate is then fitted with the radius whose +-1 pixel
//! ring holds the most edge pixels, and kept only if that ring is both
//! dense enough and spread around the full circle.

use imageproc::edges::canny;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::DotConfig;
use crate::pixel::PixelField;

/// A detected dot marker in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dot {
    pub x: i32,
    pub y: i32,
    pub radius: u32,
    /// Accumulator score that supported this center.
    pub votes: u32,
}

impl Dot {
    pub fn center(&self) -> (f64, f64) {
        (self.x as f64, self.y as f64)
    }
}

/// Detect circular dot markers. Returns an empty list when nothing circular is present.
pub fn detect_dots(field: &PixelField, config: &DotConfig) -> Vec<Dot> {
    if field.is_empty() {
        return Vec::new();
    }
    let (r_min, r_max) = radius_band(config);
    let (w, h) = (field.width(), field.height());

    let blurred = match field.smoothed(config.blur_kernel_size, config.blur_sigma) {
        Ok(img) => img,
        Err(e) => {
            warn!("detect_dots: smoothing failed ({e}), voting on raw intensities");
            field.to_gray_image()
        }
    };
    let edges = canny(&blurred, config.canny_high * 0.5, config.canny_high);
    let gx = horizontal_sobel(&blurred);
    let gy = vertical_sobel(&blurred);

    let mut edge_points: Vec<EdgePixel> = Vec::new();
    let mut acc = vec![0u32; w * h];
    for (x, y, px) in edges.enumerate_pixels() {
        if px[0] == 0 {
            continue;
        }
        let (x, y) = (x as usize, y as usize);

        let dx = gx.get_pixel(x as u32, y as u32)[0] as f32;
        let dy = gy.get_pixel(x as u32, y as u32)[0] as f32;
        let mag = (dx * dx + dy * dy).sqrt();
        if mag <= f32::EPSILON {
            continue;
        }
        let (ux, uy) = (dx / mag, dy / mag);
        edge_points.push(EdgePixel {
            x: x as f32,
            y: y as f32,
            ux,
            uy,
        });
        for sign in [1.0f32, -1.0] {
            let mut last = usize::MAX;
            for r in r_min..=r_max {
                let cx = (x as f32 + sign * ux * r as f32).round();
                let cy = (y as f32 + sign * uy * r as f32).round();
                if cx < 0.0 || cy < 0.0 || cx >= w as f32 || cy >= h as f32 {
                    break;
                }
                let idx = cy as usize * w + cx as usize;
                if idx != last {
                    acc[idx] += 1;
                    last = idx;
                }
            }
        }
    }

    let score = box_sum_3x3(&acc, w, h);
    let mut candidates: Vec<usize> = (0..w * h)
        .filter(|&idx| score[idx] >= config.accumulator_threshold && is_local_max(&score, w, h, idx))
        .collect();
    candidates.sort_by(|&a, &b| score[b].cmp(&score[a]).then(a.cmp(&b)));

    let min_dist_sq = config.min_dist * config.min_dist;
    let mut dots: Vec<Dot> = Vec::new();
    let mut rejected = 0usize;
    for idx in candidates {
        let (cx, cy) = ((idx % w) as i32, (idx / w) as i32);
        let far_enough = dots.iter().all(|d| {
            let ddx = (d.x - cx) as f32;
            let ddy = (d.y - cy) as f32;
            ddx * ddx + ddy * ddy >= min_dist_sq
        });
        if !far_enough {
            continue;
        }
        let fit = fit_circle((cx, cy), &edge_points, r_min, r_max);
        if !fit.is_circular(config) {
            rejected += 1;
            continue;
        }
        dots.push(Dot {
            x: cx,
            y: cy,
            radius: fit.radius,
            votes: score[idx],
        });
    }

    debug!(
        "detect_dots: {} edge pixels, {} dots, {} non-circular peaks (radius band {}..={})",
        edge_points.len(),
        dots.len(),
        rejected,
        r_min,
        r_max
    );
    dots
}

fn radius_band(config: &DotConfig) -> (u32, u32) {
    let lo = config.min_radius.min(config.max_radius).max(1);
    let hi = config.min_radius.max(config.max_radius).max(lo);
    (lo, hi)
}

fn box_sum_3x3(acc: &[u32], w: usize, h: usize) -> Vec<u32> {
    let mut out = vec![0u32; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut s = 0u32;
            for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                    s += acc[ny * w + nx];
                }
            }
            out[y * w + x] = s;
        }
    }
    out
}

/// Strictly greater than earlier raster neighbours, at least equal to later
/// ones, so a flat plateau yields a single peak.
fn is_local_max(score: &[u32], w: usize, h: usize, idx: usize) -> bool {
    let (x, y) = (idx % w, idx / w);
    let s = score[idx];
    for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
        for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
            let n = ny * w + nx;
            if n == idx {
                continue;
            }
            if (n < idx && score[n] >= s) || (n > idx && score[n] > s) {
                return false;
            }
        }
    }
    true
}

const ARC_SECTORS: usize = 12;
/// |cos| between an edge gradient and the center direction for the pixel to
/// count as ring support (about 26 degrees).
const RADIAL_ALIGNMENT: f32 = 0.9;

/// Edge pixel with its unit gradient direction.
#[derive(Debug, Clone, Copy, PartialEq)]
struct EdgePixel {
    x: f32,
    y: f32,
    ux: f32,
    uy: f32,
}

impl EdgePixel {
    /// Distance to `center`, or `None` when the gradient does not point
    /// along the line to it.
    fn radial_distance(&self, center: (f32, f32)) -> Option<(f32, f32, f32)> {
        let (dx, dy) = (self.x - center.0, self.y - center.1);
        let d = (dx * dx + dy * dy).sqrt();
        if d <= f32::EPSILON {
            return None;
        }
        let cos = (dx * self.ux + dy * self.uy) / d;
        (cos.abs() >= RADIAL_ALIGNMENT).then_some((d, dx, dy))
    }
}

/// Ring fitted around a candidate center.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CircleFit {
    radius: u32,
    /// Radially aligned edge pixels whose rounded distance is within one of `radius`.
    support: u32,
    /// Fraction of `ARC_SECTORS` angular sectors holding a supporting pixel.
    coverage: f32,
}

impl CircleFit {
    fn is_circular(&self, config: &DotConfig) -> bool {
        let circumference = std::f32::consts::TAU * self.radius as f32;
        self.support as f32 >= config.min_circle_support * circumference
            && self.coverage >= config.min_arc_coverage
    }
}

/// Pick the radius in `[r_min, r_max]` whose +-1 ring holds the most radially
/// aligned edge pixels and measure how that ring is spread around the center.
/// Ties prefer the denser center bin, then the smaller radius.
fn fit_circle(center: (i32, i32), edge_points: &[EdgePixel], r_min: u32, r_max: u32) -> CircleFit {
    let center = (center.0 as f32, center.1 as f32);
    let radial: Vec<(f32, f32, f32)> = edge_points
        .iter()
        .filter_map(|p| p.radial_distance(center))
        .map(|(d, dx, dy)| (d.round(), dx, dy))
        .collect();

    // bins cover r_min - 1 ..= r_max + 1; r_min is at least 1
    let lo = r_min - 1;
    let mut hist = vec![0u32; (r_max - lo + 2) as usize];
    for &(d, _, _) in &radial {
        if d < lo as f32 || d > (r_max + 1) as f32 {
            continue;
        }
        hist[(d as u32 - lo) as usize] += 1;
    }
    let ring = |r: u32| {
        let i = (r - lo) as usize;
        (hist[i - 1] + hist[i] + hist[i + 1], hist[i])
    };

    let mut radius = r_min;
    let mut best = ring(r_min);
    for r in r_min + 1..=r_max {
        let key = ring(r);
        if key > best {
            radius = r;
            best = key;
        }
    }

    let mut sectors = [false; ARC_SECTORS];
    for &(d, dx, dy) in &radial {
        if (d - radius as f32).abs() > 1.0 {
            continue;
        }
        let turn = (dy.atan2(dx) + std::f32::consts::PI) / std::f32::consts::TAU;
        sectors[(turn * ARC_SECTORS as f32) as usize % ARC_SECTORS] = true;
    }
    let covered = sectors.iter().filter(|&&s| s).count();

    CircleFit {
        radius,
        support: best.0,
        coverage: covered as f32 / ARC_SECTORS as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};
    use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
    use imageproc::rect::Rect;

    fn field_with_disks(w: u32, h: u32, disks: &[(i32, i32, i32)]) -> PixelField {
        let mut img = GrayImage::from_pixel(w, h, Luma([255]));
        for &(x, y, r) in disks {
            draw_filled_circle_mut(&mut img, (x, y), r, Luma([0]));
        }
        PixelField::from_gray(w as usize, h as usize, img.into_raw()).unwrap()
    }

    #[test]
    fn blank_field_has_no_dots() {
        let field = PixelField::from_gray(64, 64, vec![200; 64 * 64]).unwrap();
        assert!(detect_dots(&field, &DotConfig::default()).is_empty());
    }

    #[test]
    fn empty_field_has_no_dots() {
        let field = PixelField::from_gray(0, 0, Vec::new()).unwrap();
        assert!(detect_dots(&field, &DotConfig::default()).is_empty());
    }

    #[test]
    fn single_disk_is_found_near_its_center() {
        let field = field_with_disks(100, 100, &[(50, 50, 8)]);
        let cfg = DotConfig::default();
        let dots = detect_dots(&field, &cfg);
        assert_eq!(dots.len(), 1, "dots: {dots:?}");
        let d = dots[0];
        assert!((d.x - 50).abs() <= 2 && (d.y - 50).abs() <= 2, "dot {d:?}");
        assert!((cfg.min_radius..=cfg.max_radius).contains(&d.radius));
        assert!((6..=10).contains(&d.radius), "radius {}", d.radius);
    }

    #[test]
    fn radii_stay_inside_a_narrow_band() {
        let field = field_with_disks(120, 120, &[(30, 30, 12), (90, 90, 6)]);
        let cfg = DotConfig {
            min_radius: 7,
            max_radius: 9,
            accumulator_threshold: 10,
            ..DotConfig::default()
        };
        for d in detect_dots(&field, &cfg) {
            assert!((7..=9).contains(&d.radius), "radius {} out of band", d.radius);
        }
    }

    #[test]
    fn inverted_band_is_normalised() {
        let cfg = DotConfig {
            min_radius: 12,
            max_radius: 4,
            ..DotConfig::default()
        };
        assert_eq!(radius_band(&cfg), (4, 12));
    }

    #[test]
    fn plateau_yields_one_peak() {
        let score = vec![0, 5, 5, 0];
        assert!(is_local_max(&score, 4, 1, 1));
        assert!(!is_local_max(&score, 4, 1, 2));
    }

    fn ring_pixels(center: (f32, f32), r: f32, degrees: std::ops::Range<i32>) -> Vec<EdgePixel> {
        degrees
            .step_by(5)
            .map(|deg| {
                let (sin, cos) = (deg as f32).to_radians().sin_cos();
                EdgePixel {
                    x: (center.0 + r * cos).round(),
                    y: (center.1 + r * sin).round(),
                    ux: cos,
                    uy: sin,
                }
            })
            .collect()
    }

    #[test]
    fn full_ring_fits_its_radius() {
        let edges = ring_pixels((50.0, 50.0), 8.0, 0..360);
        let fit = fit_circle((50, 50), &edges, 3, 15);
        assert_eq!(fit.radius, 8);
        assert_eq!(fit.support, 72);
        assert_eq!(fit.coverage, 1.0);
        assert!(fit.is_circular(&DotConfig::default()));
    }

    #[test]
    fn half_ring_is_not_circular() {
        let edges = ring_pixels((50.0, 50.0), 8.0, 0..180);
        let fit = fit_circle((50, 50), &edges, 3, 15);
        assert!(fit.coverage < 0.6, "{fit:?}");
        assert!(!fit.is_circular(&DotConfig::default()));
    }

    #[test]
    fn parallel_edges_are_not_circular() {
        let mut edges = Vec::new();
        for x in 20..=80 {
            let x = x as f32;
            edges.push(EdgePixel { x, y: 47.0, ux: 0.0, uy: -1.0 });
            edges.push(EdgePixel { x, y: 53.0, ux: 0.0, uy: 1.0 });
        }
        let fit = fit_circle((50, 50), &edges, 3, 15);
        assert!(fit.coverage <= 0.5, "{fit:?}");
        assert!(!fit.is_circular(&DotConfig::default()));
    }

    #[test]
    fn stroke_without_dots_has_no_dots() {
        let mut img = GrayImage::from_pixel(200, 200, Luma([255]));
        draw_filled_rect_mut(&mut img, Rect::at(40, 40).of_size(120, 120), Luma([0]));
        draw_filled_rect_mut(&mut img, Rect::at(46, 46).of_size(108, 108), Luma([255]));
        let field = PixelField::from_gray(200, 200, img.into_raw()).unwrap();
        let dots = detect_dots(&field, &DotConfig::default());
        assert!(dots.is_empty(), "dots on a plain stroke: {dots:?}");
    }
}
