//! Stable error taxonomy.
//!
//! Every caller-visible failure carries one of these codes in the response
//! envelope. The strings are part of the wire contract; do not rename.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable string codes surfaced in the `error.code` envelope field and in
/// terminal WebSocket error payloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "INVALID_QUERY")]
    InvalidQuery,
    #[serde(rename = "INVALID_ISBN")]
    InvalidIsbn,
    #[serde(rename = "MISSING_PARAMETER")]
    MissingParameter,
    #[serde(rename = "RATE_LIMIT_EXCEEDED")]
    RateLimitExceeded,
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    #[serde(rename = "PROVIDER_ERROR")]
    ProviderError,
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
    #[serde(rename = "FILE_TOO_LARGE")]
    FileTooLarge,
    #[serde(rename = "E_EMPTY_BATCH")]
    EmptyBatch,
    #[serde(rename = "E_CSV_PROCESSING_FAILED")]
    CsvProcessingFailed,
    #[serde(rename = "INVALID_TRANSITION")]
    InvalidTransition,
    #[serde(rename = "VERSION_CONFLICT")]
    VersionConflict,
}

impl ErrorCode {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidQuery => "INVALID_QUERY",
            Self::InvalidIsbn => "INVALID_ISBN",
            Self::MissingParameter => "MISSING_PARAMETER",
            Self::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            Self::NotFound => "NOT_FOUND",
            Self::ProviderError => "PROVIDER_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
            Self::FileTooLarge => "FILE_TOO_LARGE",
            Self::EmptyBatch => "E_EMPTY_BATCH",
            Self::CsvProcessingFailed => "E_CSV_PROCESSING_FAILED",
            Self::InvalidTransition => "INVALID_TRANSITION",
            Self::VersionConflict => "VERSION_CONFLICT",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_matches_as_str() {
        for code in [
            ErrorCode::InvalidQuery,
            ErrorCode::InvalidIsbn,
            ErrorCode::MissingParameter,
            ErrorCode::RateLimitExceeded,
            ErrorCode::NotFound,
            ErrorCode::ProviderError,
            ErrorCode::InternalError,
            ErrorCode::FileTooLarge,
            ErrorCode::EmptyBatch,
            ErrorCode::CsvProcessingFailed,
            ErrorCode::InvalidTransition,
            ErrorCode::VersionConflict,
        ] {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }
}
