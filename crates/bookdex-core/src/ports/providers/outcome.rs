//! Shared result shape for every provider operation.

use crate::domain::ProviderId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of provider failures.
///
/// The classification decides orchestrator fallback and pipeline
/// `retryable` reporting, so it is part of the port contract rather than an
/// implementation detail of any one client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderErrorKind {
    /// No API key configured; no request was issued.
    NoApiKey,
    /// 401 from the provider.
    BadAuth,
    /// 429 from the provider.
    RateLimited,
    /// 404 from the provider.
    NotFound,
    /// 5xx or a response that was not parseable JSON.
    Provider,
    /// The 5 s hard deadline elapsed; the request was aborted.
    Timeout,
    /// Connection refusal, DNS failure, TLS failure.
    Network,
}

impl ProviderErrorKind {
    /// Whether a pipeline may usefully retry this failure later.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Provider | Self::Timeout | Self::Network)
    }
}

/// A classified provider failure.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{kind:?}: {message}")]
pub struct ProviderFailure {
    pub kind: ProviderErrorKind,
    pub message: String,
    /// Seconds from the provider's Retry-After header, when present.
    pub retry_after_seconds: Option<u64>,
}

impl ProviderFailure {
    #[must_use]
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), retry_after_seconds: None }
    }

    #[must_use]
    pub fn rate_limited(message: impl Into<String>, retry_after_seconds: Option<u64>) -> Self {
        Self {
            kind: ProviderErrorKind::RateLimited,
            message: message.into(),
            retry_after_seconds,
        }
    }
}

/// Outcome of one provider operation: the typed payload (or classified
/// failure) plus timing. Clients never retry; they report exactly what
/// happened and leave fallback to the orchestrator.
#[derive(Clone, Debug)]
pub struct ProviderResponse<T> {
    pub provider: ProviderId,
    pub elapsed_ms: u64,
    pub outcome: Result<T, ProviderFailure>,
}

impl<T> ProviderResponse<T> {
    #[must_use]
    pub const fn ok(provider: ProviderId, elapsed_ms: u64, payload: T) -> Self {
        Self { provider, elapsed_ms, outcome: Ok(payload) }
    }

    #[must_use]
    pub const fn failed(provider: ProviderId, elapsed_ms: u64, failure: ProviderFailure) -> Self {
        Self { provider, elapsed_ms, outcome: Err(failure) }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The payload, discarding failure detail.
    #[must_use]
    pub fn into_payload(self) -> Option<T> {
        self.outcome.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ProviderErrorKind::Timeout.is_retryable());
        assert!(ProviderErrorKind::RateLimited.is_retryable());
        assert!(ProviderErrorKind::Provider.is_retryable());
        assert!(ProviderErrorKind::Network.is_retryable());
        assert!(!ProviderErrorKind::NoApiKey.is_retryable());
        assert!(!ProviderErrorKind::BadAuth.is_retryable());
        assert!(!ProviderErrorKind::NotFound.is_retryable());
    }

    #[test]
    fn test_rate_limited_carries_retry_after() {
        let failure = ProviderFailure::rate_limited("quota exhausted", Some(30));
        assert_eq!(failure.retry_after_seconds, Some(30));
        assert_eq!(failure.kind, ProviderErrorKind::RateLimited);
    }
}
