//! Composition root: wire concrete adapters into the core and serve.

use crate::routes::router;
use crate::state::AppState;
use anyhow::Context;
use bookdex_cache::{Cache, MemoryTier};
use bookdex_core::config::CoreConfig;
use bookdex_core::ports::{AnalyticsSink, Credential, JobStorePort, LogAnalytics};
use bookdex_enrich::{EnrichDeps, Enricher, EnrichmentPort};
use bookdex_jobs::{JobRegistry, MemoryJobStore, PipelineDeps};
use bookdex_providers::{
    ClientConfig, IsbnRegistryClient, OpenBibClient, ReqwestBackend, VisionModelClient,
    VolumeCatalogClient,
};
use bookdex_ratelimit::{MemoryRateStore, RateLimiter};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Provider credentials, one per upstream that needs a key.
#[derive(Clone, Debug, Default)]
pub struct ProviderCredentials {
    pub volume_catalog: Credential,
    pub isbn_registry: Credential,
    pub vision_model: Credential,
}

/// Build the full application state from configuration.
///
/// Single-node wiring: in-memory cache tiers, job store, and rate-limit
/// store. Every seam is a port, so a distributed deployment swaps the
/// adapters here without touching the core.
#[must_use]
pub fn build_state(config: CoreConfig, credentials: ProviderCredentials) -> AppState {
    let analytics: Arc<dyn AnalyticsSink> = Arc::new(LogAnalytics);
    let timeout = config.provider_timeout_ms;

    let volume = VolumeCatalogClient::new(
        ReqwestBackend::new(),
        ClientConfig::volume_catalog(credentials.volume_catalog, timeout),
        Arc::clone(&analytics),
    );
    let openbib = OpenBibClient::new(
        ReqwestBackend::new(),
        ClientConfig::open_bib(timeout),
        Arc::clone(&analytics),
    );
    let registry_client = IsbnRegistryClient::new(
        ReqwestBackend::new(),
        ClientConfig::isbn_registry(credentials.isbn_registry, timeout),
        Arc::clone(&analytics),
    );
    let vision = Arc::new(VisionModelClient::new(
        ReqwestBackend::new(),
        ClientConfig::vision_model(credentials.vision_model, timeout),
        Arc::clone(&analytics),
    ));

    let cache = Arc::new(Cache::new(Arc::new(MemoryTier::new()), Arc::new(MemoryTier::new())));
    let enricher: Arc<dyn EnrichmentPort> = Arc::new(Enricher::new(
        EnrichDeps {
            volume: Arc::new(volume),
            openbib: Arc::new(openbib),
            registry: Arc::new(registry_client),
        },
        Arc::clone(&cache),
        config.clone(),
    ));

    let job_store: Arc<dyn JobStorePort> = Arc::new(MemoryJobStore::new());
    let job_registry = Arc::new(JobRegistry::new(job_store, config.clone()));
    let jobs = PipelineDeps {
        registry: job_registry,
        enricher: Arc::clone(&enricher),
        vision,
        cache,
        config: config.clone(),
    };

    let limiter = Arc::new(RateLimiter::new(
        Arc::new(MemoryRateStore::new()),
        config.rate_window_seconds,
        config.rate_max_requests,
    ));

    AppState::new(enricher, jobs, limiter, config)
}

/// Serve until ctrl-c.
pub async fn serve(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "bookdex listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install ctrl-c handler");
        return;
    }
    info!("shutdown signal received");
}
