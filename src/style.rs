//! Pulli / sikku / chuzhi classification from dot and curve counts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stylistic family of a kolam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleLabel {
    /// Dot dominant.
    Pulli,
    /// Line dominant, continuous paths.
    Sikku,
    /// Balanced.
    Chuzhi,
}

impl StyleLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StyleLabel::Pulli => "pulli",
            StyleLabel::Sikku => "sikku",
            StyleLabel::Chuzhi => "chuzhi",
        }
    }

    pub fn cultural_note(&self) -> &'static str {
        match self {
            StyleLabel::Pulli => "Dot-based kolam, often used for daily practice",
            StyleLabel::Sikku => "Line-based kolam with continuous paths, festival style",
            StyleLabel::Chuzhi => "Balanced kolam combining dots and lines",
        }
    }
}

impl fmt::Display for StyleLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `dots > 2 * curves` is pulli, else `curves > dots` is sikku, else chuzhi.
pub fn classify_style(dot_count: usize, curve_count: usize) -> StyleLabel {
    if dot_count > curve_count.saturating_mul(2) {
        StyleLabel::Pulli
    } else if curve_count > dot_count {
        StyleLabel::Sikku
    } else {
        StyleLabel::Chuzhi
    }
}
