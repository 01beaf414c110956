//! Shared operation plumbing: deadline enforcement, error classification,
//! analytics recording.

use crate::http::HttpError;
use bookdex_core::domain::ProviderId;
use bookdex_core::ports::providers::{ProviderErrorKind, ProviderFailure, ProviderResponse};
use bookdex_core::ports::{AnalyticsSink, ProviderCall};
use std::future::Future;
use std::time::{Duration, Instant};

/// Map a transport failure onto the provider error taxonomy.
pub(crate) fn classify(error: HttpError) -> ProviderFailure {
    match error {
        HttpError::Status { status: 401, .. } => {
            ProviderFailure::new(ProviderErrorKind::BadAuth, "authentication rejected (401)")
        }
        HttpError::Status { status: 404, .. } => {
            ProviderFailure::new(ProviderErrorKind::NotFound, "not found (404)")
        }
        HttpError::Status { status: 429, retry_after } => {
            ProviderFailure::rate_limited("rate limited (429)", retry_after)
        }
        HttpError::Status { status, .. } => ProviderFailure::new(
            ProviderErrorKind::Provider,
            format!("provider returned status {status}"),
        ),
        HttpError::NonJson(message) => ProviderFailure::new(
            ProviderErrorKind::Provider,
            format!("unparseable response: {message}"),
        ),
        HttpError::Network(message) => {
            ProviderFailure::new(ProviderErrorKind::Network, message)
        }
    }
}

/// Run one provider operation under the hard deadline and record it.
///
/// Dropping the inner future on timeout aborts the underlying request; the
/// outcome (success, classified failure, or timeout) is recorded to the
/// analytics sink either way.
pub(crate) async fn run_operation<T, Fut, C>(
    provider: ProviderId,
    operation: &'static str,
    timeout_ms: u64,
    analytics: &dyn AnalyticsSink,
    count: C,
    fut: Fut,
) -> ProviderResponse<T>
where
    Fut: Future<Output = Result<T, ProviderFailure>>,
    C: FnOnce(&T) -> usize,
{
    let started = Instant::now();
    let outcome = match tokio::time::timeout(Duration::from_millis(timeout_ms), fut).await {
        Ok(result) => result,
        Err(_) => Err(ProviderFailure::new(
            ProviderErrorKind::Timeout,
            format!("deadline of {timeout_ms} ms exceeded"),
        )),
    };
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    analytics.record(ProviderCall {
        provider,
        operation,
        latency_ms: elapsed_ms,
        result_count: outcome.as_ref().map_or(0, |payload| count(payload)),
        error_kind: outcome.as_ref().err().map(|f| f.kind),
    });

    ProviderResponse { provider, elapsed_ms, outcome }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookdex_core::ports::NoopAnalytics;

    #[tokio::test]
    async fn test_deadline_yields_timeout() {
        let response: ProviderResponse<u32> = run_operation(
            ProviderId::VolumeCatalog,
            "search_by_isbn",
            10,
            &NoopAnalytics,
            |_| 0,
            async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(42)
            },
        )
        .await;

        let failure = response.outcome.unwrap_err();
        assert_eq!(failure.kind, ProviderErrorKind::Timeout);
    }

    #[test]
    fn test_classification_table() {
        let cases = [
            (HttpError::Status { status: 401, retry_after: None }, ProviderErrorKind::BadAuth),
            (HttpError::Status { status: 404, retry_after: None }, ProviderErrorKind::NotFound),
            (
                HttpError::Status { status: 429, retry_after: Some(30) },
                ProviderErrorKind::RateLimited,
            ),
            (HttpError::Status { status: 503, retry_after: None }, ProviderErrorKind::Provider),
            (HttpError::NonJson("<html>".to_string()), ProviderErrorKind::Provider),
            (HttpError::Network("dns failure".to_string()), ProviderErrorKind::Network),
        ];
        for (error, expected) in cases {
            assert_eq!(classify(error).kind, expected);
        }
    }

    #[test]
    fn test_rate_limit_retry_after_propagates() {
        let failure = classify(HttpError::Status { status: 429, retry_after: Some(17) });
        assert_eq!(failure.retry_after_seconds, Some(17));
    }
}
