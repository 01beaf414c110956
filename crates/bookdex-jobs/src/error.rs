//! Job subsystem errors.

use bookdex_core::error::ErrorCode;
use bookdex_core::job::InvalidTransition;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum JobError {
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    #[error("Version conflict: expected {expected}, actual {actual}")]
    VersionConflict { expected: u64, actual: u64 },

    /// Presented token does not match the job's token.
    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    /// Refresh requested outside the final window of the token's life.
    #[error("More than 30 minutes remain")]
    RefreshTooEarly,

    /// No token has been set for the job yet.
    #[error("No token set")]
    NoToken,

    #[error("Empty batch")]
    EmptyBatch,

    #[error("invalid ISBN: {0}")]
    InvalidIsbn(String),

    #[error("input of {actual_bytes} bytes exceeds the {max_bytes}-byte limit")]
    FileTooLarge { actual_bytes: usize, max_bytes: usize },

    #[error("photo index {0} out of range")]
    PhotoIndexOutOfRange(usize),

    #[error("job storage failure: {0}")]
    Storage(String),

    /// The actor task is gone (mailbox closed).
    #[error("job actor unavailable")]
    ActorUnavailable,
}

impl JobError {
    /// Stable wire code for the response envelope.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidTransition(_) => ErrorCode::InvalidTransition,
            Self::VersionConflict { .. } => ErrorCode::VersionConflict,
            Self::InvalidToken | Self::TokenExpired | Self::NoToken => ErrorCode::NotFound,
            Self::RefreshTooEarly => ErrorCode::InvalidQuery,
            Self::EmptyBatch => ErrorCode::EmptyBatch,
            Self::InvalidIsbn(_) => ErrorCode::InvalidIsbn,
            Self::FileTooLarge { .. } => ErrorCode::FileTooLarge,
            Self::PhotoIndexOutOfRange(_) => ErrorCode::InvalidQuery,
            Self::Storage(_) | Self::ActorUnavailable => ErrorCode::InternalError,
        }
    }
}
