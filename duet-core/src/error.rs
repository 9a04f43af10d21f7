//! Error types for duet.

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;

/// Errors that can occur while loading events or computing layouts.
#[derive(Error, Debug)]
pub enum DuetError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("Event '{id}' ends before it starts ({start} > {end})")]
    InvalidRange {
        id: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Local time {datetime} does not exist in {tz}")]
    NonexistentLocalTime { datetime: NaiveDateTime, tz: String },

    #[error("Recurrence error: {0}")]
    Recurrence(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for duet operations.
pub type DuetResult<T> = Result<T, DuetError>;
