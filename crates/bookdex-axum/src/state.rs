//! Shared application state injected into every handler.

use bookdex_core::config::CoreConfig;
use bookdex_enrich::EnrichmentPort;
use bookdex_jobs::PipelineDeps;
use bookdex_ratelimit::RateLimiter;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub enricher: Arc<dyn EnrichmentPort>,
    pub jobs: PipelineDeps,
    pub limiter: Arc<RateLimiter>,
    pub config: CoreConfig,
}

impl AppState {
    #[must_use]
    pub fn new(
        enricher: Arc<dyn EnrichmentPort>,
        jobs: PipelineDeps,
        limiter: Arc<RateLimiter>,
        config: CoreConfig,
    ) -> Self {
        Self { enricher, jobs, limiter, config }
    }
}
