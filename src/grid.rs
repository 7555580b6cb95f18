//! Dot-grid topology classification.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{DistanceSpread, GridConfig};
use crate::dots::Dot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridType {
    Square,
    Diamond,
    Irregular,
}

impl GridType {
    pub fn as_str(&self) -> &'static str {
        match self {
            GridType::Square => "square",
            GridType::Diamond => "diamond",
            GridType::Irregular => "irregular",
        }
    }
}

impl fmt::Display for GridType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridProfile {
    pub grid_type: GridType,
    pub estimated_size: u32,
}

impl GridProfile {
    /// `"{size}x{size} {type}"`, as reported in the analysis record.
    pub fn description(&self) -> String {
        format!("{0}x{0} {1}", self.estimated_size, self.grid_type)
    }
}

/// Classify the dot arrangement and estimate the grid dimension.
///
/// Fewer than four dots is always irregular. Pairwise distances are O(n^2);
/// kolam dot counts are in the tens.
pub fn classify_grid(dots: &[Dot], config: &GridConfig) -> GridProfile {
    let estimated_size = estimate_size(dots.len(), config);
    if dots.len() < 4 {
        return GridProfile {
            grid_type: GridType::Irregular,
            estimated_size,
        };
    }

    let std = distance_spread(dots, config.spread);
    let grid_type = if std < config.square_max_std {
        GridType::Square
    } else if std < config.diamond_max_std {
        GridType::Diamond
    } else {
        GridType::Irregular
    };

    GridProfile {
        grid_type,
        estimated_size,
    }
}

/// `clamp(round(sqrt(n)), min, max)`; the configured default when there are no dots.
pub fn estimate_size(dot_count: usize, config: &GridConfig) -> u32 {
    let (lo, hi) = (config.min_size.min(config.max_size), config.max_size.max(config.min_size));
    if dot_count == 0 {
        return config.default_size.clamp(lo, hi);
    }
    ((dot_count as f64).sqrt().round() as u32).clamp(lo, hi)
}

/// Population standard deviation of the selected distance set.
pub fn distance_spread(dots: &[Dot], spread: DistanceSpread) -> f64 {
    let n = dots.len();
    if n < 2 {
        return 0.0;
    }
    let mut matrix = vec![0f64; n * n];
    for i in 0..n {
        for j in (i + 1)..n {
            let (ax, ay) = dots[i].center();
            let (bx, by) = dots[j].center();
            let d = ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt();
            matrix[i * n + j] = d;
            matrix[j * n + i] = d;
        }
    }

    let samples: Vec<f64> = match spread {
        DistanceSpread::AllPairs => (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .map(|(i, j)| matrix[i * n + j])
            .collect(),
        DistanceSpread::NearestNeighbour => (0..n)
            .map(|i| {
                (0..n)
                    .filter(|&j| j != i)
                    .map(|j| matrix[i * n + j])
                    .fold(f64::INFINITY, f64::min)
            })
            .collect(),
    };
    std_dev(&samples)
}

fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}
