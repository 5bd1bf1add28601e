//! Error Handling and Shared Helpers
//!
//! This module provides the crate-wide error type and the timestamp helper
//! used when stamping account documents.
//!
//! # Important Notes
//!
//! * Lookups that find nothing return `Ok(None)`; absence is not an error
//! * Backing-store faults propagate unchanged, there is no retry logic
//! * Timestamps are UTC and carry millisecond precision

use chrono::{DateTime, Timelike, Utc};

/// Default Error type for this crate
#[derive(Debug)]
pub enum AccountError {
    /// The backing store reported a fault
    Driver(String),
    /// An identifier could not be parsed into a document id
    InvalidId(String),
    /// A required argument was absent or blank
    InvalidArgument(String),
    /// The store was used after `dispose`
    Disposed,
    /// The connection configuration could not be resolved
    Configuration(String),
    /// The operation is deliberately not supported by this store
    Unimplemented(&'static str),
    /// Generic error
    Generic(String),
}

impl AccountError {
    pub(crate) fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Generic(msg.into())
    }

    /// Consumes self and returns the underlying error message
    pub fn into_string(self) -> String {
        match self {
            AccountError::Driver(e) => e,
            AccountError::InvalidId(e) => e,
            AccountError::InvalidArgument(e) => e,
            AccountError::Disposed => "The store has been disposed".to_string(),
            AccountError::Configuration(e) => e,
            AccountError::Unimplemented(e) => e.to_string(),
            AccountError::Generic(e) => e,
        }
    }
}

impl std::fmt::Display for AccountError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

impl From<mongodb::error::Error> for AccountError {
    fn from(e: mongodb::error::Error) -> Self {
        AccountError::Driver(format!("{e}"))
    }
}

impl std::error::Error for AccountError {}

/// Returns the present UTC timestamp, truncated to the precision the backing
/// store can represent. BSON datetimes carry milliseconds; stamping at the
/// same granularity keeps the in-memory record identical to its stored form.
pub fn present_timestamp() -> DateTime<Utc> {
    let now = Utc::now();
    now.with_nanosecond(now.nanosecond() / 1_000_000 * 1_000_000)
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::present_timestamp;

    #[test]
    fn timestamps_are_millisecond_aligned() {
        let stamp = present_timestamp();
        assert_eq!(stamp.timestamp_subsec_nanos() % 1_000_000, 0);
    }
}
