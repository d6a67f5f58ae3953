//! Error types for Dayflux

use thiserror::Error;

/// Errors that can occur during computation
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("No activity data for {date}")]
    MissingData { date: String },

    #[error("Unknown activity category: {0}")]
    UnknownCategory(String),

    #[error("Hour {hour} out of range on {date} (expected 0-24)")]
    InvalidHour { date: String, hour: String },

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid category template: {0}")]
    InvalidTemplate(String),

    #[error("Dataset contains no days")]
    EmptyDataset,

    #[error("Failed to parse dataset: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}

impl ComputeError {
    /// Whether the error only concerns a single day of a batch
    pub fn is_day_scoped(&self) -> bool {
        matches!(
            self,
            ComputeError::MissingData { .. }
                | ComputeError::UnknownCategory(_)
                | ComputeError::InvalidHour { .. }
                | ComputeError::DateParseError(_)
        )
    }
}
