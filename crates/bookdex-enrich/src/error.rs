//! Enrichment error types.
//!
//! Only input validation surfaces as an error; provider failures are
//! absorbed by the best-effort policy and degrade the response instead.

use bookdex_core::error::ErrorCode;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EnrichError {
    #[error("invalid ISBN: {0}")]
    InvalidIsbn(String),

    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

impl EnrichError {
    /// Stable wire code for the response envelope.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidIsbn(_) => ErrorCode::InvalidIsbn,
            Self::InvalidQuery(_) => ErrorCode::InvalidQuery,
        }
    }
}
