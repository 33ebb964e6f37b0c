//! Error types for the habit tracker core

use thiserror::Error;

/// Errors that can occur while encoding, storing or computing habit data
#[derive(Debug, Error)]
pub enum TrackerError {
    /// A stored habit type string could not be decoded. Carries the full
    /// offending text so a corrupt row can be traced back to its source.
    #[error("Invalid habit type encoding {value:?}: {reason}")]
    InvalidEncoding { value: String, reason: String },

    #[error("Date parse error: {0}")]
    DateParse(String),

    #[error("Invalid habit: {0}")]
    InvalidHabit(String),

    #[error("Habit not found: {0}")]
    NotFound(i64),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown locale: {0}")]
    UnknownLocale(String),
}

impl TrackerError {
    pub(crate) fn invalid_encoding(value: &str, reason: impl Into<String>) -> Self {
        TrackerError::InvalidEncoding {
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error means a stored row could not be decoded
    pub fn is_corrupt_row(&self) -> bool {
        matches!(
            self,
            TrackerError::InvalidEncoding { .. } | TrackerError::DateParse(_)
        )
    }
}
