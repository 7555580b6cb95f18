use kornia::image::ImageError;

/// Errors surfaced by the kolam pipeline.
///
/// Detectors and classifiers are total over a valid [`crate::PixelField`], so
/// the only ways a request fails are bad input or a fault caught at the
/// service boundary.
#[derive(Debug, thiserror::Error)]
pub enum KolamError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("analysis failed: {0}")]
    AnalysisFailure(String),

    #[error("kornia image error: {0}")]
    Image(#[from] ImageError),

    #[error("config error: {0}")]
    Config(String),
}
