//! Cache error types.

use thiserror::Error;

/// Substrate failure in a cache tier. The service layer treats these as
/// misses: a broken cache degrades performance, never correctness.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache storage failure: {0}")]
    Storage(String),
}

/// Error surfaced by `get_or_fetch` when the fetcher itself failed. The
/// string is the fetcher's own error message; fetch failures are never
/// cached.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("fetch failed: {0}")]
pub struct FetchError(pub String);
