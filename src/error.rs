use thiserror::Error;

/// Validation failures raised by the analysis stages before any output is built.
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("band `{0}` is not present in the grid")]
    BandMismatch(String),

    #[error("expected {expected} bands, found {found}")]
    BandCountMismatch { expected: usize, found: usize },

    #[error("grid geometry mismatch: {0}")]
    ShapeMismatch(String),

    #[error("mask `{0}` selects no cells")]
    EmptyMaskResult(String),

    #[error("series needs at least {required} steps, found {found}")]
    InsufficientSeries { required: usize, found: usize },
}
