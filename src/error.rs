//! Error types for the pace pipeline.

use thiserror::Error;

/// Pace pipeline errors
#[derive(Debug, Error)]
pub enum PaceError {
    /// A figure would divide by zero or come out non-finite.
    #[error("insufficient data: {reason}")]
    InsufficientData { reason: String },

    #[error("no average variant for {track_code} {surface} at {distance} yards")]
    VariantNotFound {
        track_code: String,
        distance: i64,
        surface: String,
    },

    #[error("invalid race date: {0}")]
    InvalidDate(String),

    #[error("failed to read data: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PaceError {
    pub(crate) fn insufficient(reason: impl Into<String>) -> Self {
        PaceError::InsufficientData {
            reason: reason.into(),
        }
    }

    /// Whether this error marks degenerate input rather than a defect.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, PaceError::InsufficientData { .. })
    }
}

pub type Result<T> = std::result::Result<T, PaceError>;
