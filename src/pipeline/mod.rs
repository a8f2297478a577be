//! End-to-end runs driven by a [`Config`](crate::config::Config).

pub mod batch_runner;

pub use batch_runner::{BatchReport, BatchRunner, PeriodSummary};

use thiserror::Error;

use crate::config::ConfigError;
use crate::error::AnalysisError;
use crate::readers::{FileError, ReadError};
use crate::writers::WriteError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    File(#[from] FileError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file not found: {0}")]
    MissingFile(String),

    #[error("series `{name}` expects {expected} rasters, found {found}")]
    SeriesLength {
        name: String,
        expected: usize,
        found: usize,
    },
}
