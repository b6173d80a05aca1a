//! Session cache error types

use crate::snapshot::ValidationError;
use crate::storage::StoreError;
use chrono::NaiveDate;
use thiserror::Error;

/// Errors surfaced by the session cache
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Dose status change for an id the day does not have
    #[error("No dose '{id}' scheduled on {date}")]
    UnknownDose { date: NaiveDate, id: String },

    /// Shutdown finished with writes that never reached the store
    #[error("Unflushed changes remain for {}", format_dates(.0))]
    PendingWrites(Vec<NaiveDate>),
}

fn format_dates(dates: &[NaiveDate]) -> String {
    dates
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<ValidationError> for SessionError {
    fn from(err: ValidationError) -> Self {
        SessionError::Store(StoreError::InvalidField(err))
    }
}

impl From<SessionError> for StoreError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Store(e) => e,
            SessionError::UnknownDose { id, .. } => {
                StoreError::InvalidField(ValidationError::new("medications.id", format!("unknown dose '{}'", id)))
            }
            other => StoreError::StoreUnavailable(other.to_string()),
        }
    }
}

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;
