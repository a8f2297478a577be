use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("end_date cannot be earlier than start_date")]
    DateOrder,

    #[error("Failed to parse date: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("period `{period}` needs 4 hazard rasters (POC flux, O2, pH, temperature), found {found}")]
    MissingHazards { period: String, found: usize },

    #[error("invalid depth thresholds: {0}")]
    DepthThresholds(String),
}
