//! Background job pipelines.
//!
//! Every pipeline follows the same driver skeleton: create the job's actor,
//! mint and set the capability token, hand the caller a ticket, then (in a
//! background task) wait up to 10 s for the client's ready handshake and do
//! the work, streaming progress through the actor. Pipelines never throw:
//! failures become the terminal `error` message and persist in the job
//! state.

mod batch;
mod csv;
mod scan;
mod single;

pub use batch::start_batch_enrichment;
pub use csv::start_csv_import;
pub use scan::start_bookshelf_scan;
pub use single::start_single_enrichment;

use crate::actor::ProgressHandle;
use crate::error::JobError;
use crate::registry::JobRegistry;
use crate::token;
use bookdex_cache::Cache;
use bookdex_core::config::CoreConfig;
use bookdex_core::error::ErrorCode;
use bookdex_core::job::JobPipeline;
use bookdex_core::ports::providers::VisionModelPort;
use bookdex_enrich::EnrichmentPort;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Everything a pipeline driver needs, injected once at the composition
/// root.
#[derive(Clone)]
pub struct PipelineDeps {
    pub registry: Arc<JobRegistry>,
    pub enricher: Arc<dyn EnrichmentPort>,
    pub vision: Arc<dyn VisionModelPort>,
    pub cache: Arc<Cache>,
    pub config: CoreConfig,
}

/// What the caller gets back from starting a job: enough to connect the
/// progress WebSocket.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTicket {
    pub job_id: Uuid,
    pub token: String,
    pub total_count: u32,
}

/// Create the job's actor and arm its capability token.
pub(crate) async fn open_job(
    deps: &PipelineDeps,
    job_id: Uuid,
    pipeline: JobPipeline,
    total_count: u32,
) -> Result<(ProgressHandle, JobTicket), JobError> {
    let handle = deps.registry.create(job_id, pipeline, total_count).await?;
    let token = token::mint_token();
    handle
        .set_auth_token(token.clone(), deps.config.token_lifetime_seconds)
        .await?;
    Ok((handle, JobTicket { job_id, token, total_count }))
}

/// Wait for the client's ready frame. Timeout and disconnect are logged and
/// tolerated; the pipeline runs either way and its results stay
/// retrievable from persisted state.
pub(crate) async fn await_ready(deps: &PipelineDeps, handle: &ProgressHandle) {
    let timeout = Duration::from_millis(deps.config.ready_handshake_timeout_ms);
    let wait = handle.wait_for_ready(timeout).await;
    if !wait.ready {
        debug!(
            job_id = %handle.job_id(),
            timed_out = wait.timed_out,
            disconnected = wait.disconnected,
            "ready handshake incomplete, continuing"
        );
    }
}

/// Terminal error payload shape shared by all pipelines.
pub(crate) fn error_payload(code: ErrorCode, message: &str, retryable: bool) -> serde_json::Value {
    json!({ "code": code.as_str(), "message": message, "retryable": retryable })
}
