//! Record store error types

use crate::snapshot::{FieldGroup, ValidationError};
use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur in the record store
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Stored payload for one day failed its checksum or could not be decoded
    #[error("Corrupt record for {date} ({group}): {reason}")]
    CorruptRecord {
        date: NaiveDate,
        group: String,
        reason: String,
    },

    /// The durable medium is not accessible; the write was not applied
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Rejected at the write boundary before any merge
    #[error(transparent)]
    InvalidField(#[from] ValidationError),

    /// The day is past the amendment window
    #[error("Record for {0} is no longer editable")]
    ImmutableRecord(NaiveDate),

    /// Range start after range end
    #[error("Invalid date range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

impl StoreError {
    pub(crate) fn corrupt(date: NaiveDate, group: FieldGroup, reason: impl Into<String>) -> Self {
        StoreError::CorruptRecord {
            date,
            group: group.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether retrying the same write can succeed later
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::StoreUnavailable(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::StoreUnavailable(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::StoreUnavailable(err.to_string())
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 3).unwrap();
        let err = StoreError::corrupt(date, FieldGroup::Vitals, "checksum mismatch");
        assert_eq!(
            err.to_string(),
            "Corrupt record for 2025-01-03 (vitals): checksum mismatch"
        );

        let err = StoreError::InvalidField(ValidationError::new("mood_entries.score", "0 is outside 1..=10"));
        assert_eq!(err.to_string(), "Invalid field mood_entries.score: 0 is outside 1..=10");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: StoreError = io_err.into();
        assert!(matches!(err, StoreError::StoreUnavailable(_)));
        assert!(err.is_retryable());
        assert!(!StoreError::ImmutableRecord(NaiveDate::MIN).is_retryable());
    }
}
