//! Mirror and quarter-turn symmetry tests on the intensity field.

use serde::{Deserialize, Serialize};

use crate::config::SymmetryConfig;
use crate::pixel::PixelField;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymmetryProfile {
    pub horizontal: bool,
    pub vertical: bool,
    pub rotational_90: bool,
    pub four_fold: bool,
}

impl SymmetryProfile {
    pub fn new(horizontal: bool, vertical: bool, rotational_90: bool) -> Self {
        Self {
            horizontal,
            vertical,
            rotational_90,
            four_fold: horizontal && vertical && rotational_90,
        }
    }

    /// Coarse human-readable class, strongest first.
    pub fn label(&self) -> &'static str {
        if self.four_fold {
            "4-fold rotational"
        } else if self.horizontal && self.vertical {
            "bilateral"
        } else if self.horizontal {
            "horizontal"
        } else if self.vertical {
            "vertical"
        } else {
            "asymmetric"
        }
    }
}

pub fn analyze_symmetry(field: &PixelField, config: &SymmetryConfig) -> SymmetryProfile {
    let (w, h) = (field.width(), field.height());
    let matches = |diff: Option<f64>| diff.is_some_and(|d| d < config.tolerance);

    // left half against the mirrored right half
    let horizontal = mean_abs_diff(w / 2, h, |x, y| {
        (field.intensity(x, y), field.intensity(w - 1 - x, y))
    });
    // top half against the mirrored bottom half
    let vertical = mean_abs_diff(w, h / 2, |x, y| {
        (field.intensity(x, y), field.intensity(x, h - 1 - y))
    });
    // clockwise quarter turn maps (x, y) to (h - 1 - y, x); compared over the overlap
    let side = w.min(h);
    let rotational = mean_abs_diff(side, side, |x, y| {
        (field.intensity(x, y), field.intensity(y, h - 1 - x))
    });

    SymmetryProfile::new(matches(horizontal), matches(vertical), matches(rotational))
}

/// Mean |a - b| over a `w` x `h` region, `None` when the region is empty.
fn mean_abs_diff(w: usize, h: usize, sample: impl Fn(usize, usize) -> (u8, u8)) -> Option<f64> {
    if w == 0 || h == 0 {
        return None;
    }
    let mut total = 0u64;
    for y in 0..h {
        for x in 0..w {
            let (a, b) = sample(x, y);
            total += a.abs_diff(b) as u64;
        }
    }
    Some(total as f64 / (w * h) as f64)
}
