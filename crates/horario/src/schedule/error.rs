//! Error types for the schedule subsystem.

use thiserror::Error;

/// Errors that can occur while fetching, reconciling or persisting courses.
#[derive(Debug, Error, Clone)]
pub enum ScheduleError {
    /// A single feed record could not be given an identity
    #[error("Invalid course record ({placeholder}): {reason}")]
    InvalidRecord { placeholder: String, reason: String },

    /// Network/HTTP request failed
    #[error("Network error: {message}")]
    Network { message: String },

    /// The feed answered with a non-2xx status
    #[error("Feed request failed with status {status}")]
    HttpStatus { status: u16 },

    /// The feed body was not valid JSON
    #[error("Malformed feed: {message}")]
    MalformedFeed { message: String },

    /// The feed body lacked `data.allSalasUdps.edges`
    #[error("Feed is missing the data.allSalasUdps.edges array")]
    MissingEdges,

    /// The key/value store could not be read or written
    #[error("Store error: {message}")]
    Store { message: String },

    /// An import code was rejected before touching any state
    #[error("Invalid import: {message}")]
    InvalidImport { message: String },

    /// A manually entered course failed validation
    #[error("Invalid course: {message}")]
    InvalidCourse { message: String },

    /// The feed failed and there is no cached data to fall back on
    #[error("No course data available: {reason}")]
    NoData { reason: String },

    /// Configuration could not be loaded
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ScheduleError {
    /// Returns true if this error aborts a whole fetch cycle
    /// (and therefore triggers the cache fallback).
    pub fn is_feed_failure(&self) -> bool {
        matches!(
            self,
            ScheduleError::Network { .. }
                | ScheduleError::HttpStatus { .. }
                | ScheduleError::MalformedFeed { .. }
                | ScheduleError::MissingEdges
        )
    }

    /// Returns true if the error must be shown to the user rather than
    /// recovered locally.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            ScheduleError::NoData { .. }
                | ScheduleError::InvalidImport { .. }
                | ScheduleError::InvalidCourse { .. }
        )
    }
}

impl From<reqwest::Error> for ScheduleError {
    fn from(err: reqwest::Error) -> Self {
        ScheduleError::Network {
            message: err.to_string(),
        }
    }
}

impl From<rusqlite::Error> for ScheduleError {
    fn from(err: rusqlite::Error) -> Self {
        ScheduleError::Store {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ScheduleError {
    fn from(err: serde_json::Error) -> Self {
        ScheduleError::MalformedFeed {
            message: err.to_string(),
        }
    }
}
