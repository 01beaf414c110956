//! Analytics sink port.
//!
//! Provider clients record one event per upstream call. Sinks are
//! fire-and-forget: a failing sink is the sink's problem, never the
//! request path's.

use crate::domain::ProviderId;
use crate::ports::providers::ProviderErrorKind;

/// One recorded upstream provider call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderCall {
    pub provider: ProviderId,
    pub operation: &'static str,
    pub latency_ms: u64,
    pub result_count: usize,
    pub error_kind: Option<ProviderErrorKind>,
}

/// Port for the analytics event sink.
pub trait AnalyticsSink: Send + Sync {
    /// Record a provider call. Must not block and must not fail the caller.
    fn record(&self, call: ProviderCall);
}

/// Sink that drops everything. Useful for tests and minimal deployments.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopAnalytics;

impl AnalyticsSink for NoopAnalytics {
    fn record(&self, _call: ProviderCall) {}
}

/// Sink that emits each call as a structured tracing event.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogAnalytics;

impl AnalyticsSink for LogAnalytics {
    fn record(&self, call: ProviderCall) {
        tracing::info!(
            provider = %call.provider,
            operation = call.operation,
            latency_ms = call.latency_ms,
            result_count = call.result_count,
            error_kind = ?call.error_kind,
            "provider call"
        );
    }
}
