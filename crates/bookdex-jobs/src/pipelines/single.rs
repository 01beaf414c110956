//! Streamed single-ISBN enrichment: the async variant of the synchronous
//! lookup endpoint.

use super::{PipelineDeps, JobTicket, await_ready, error_payload, open_job};
use crate::actor::ProgressHandle;
use crate::error::JobError;
use bookdex_core::job::JobPipeline;
use bookdex_core::normalize::normalize_isbn;
use bookdex_enrich::EnrichError;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

/// Start a single-enrichment job. The ISBN is validated up front; a bad
/// ISBN fails the request, not the job.
pub async fn start_single_enrichment(
    deps: PipelineDeps,
    isbn: &str,
) -> Result<JobTicket, JobError> {
    let normalized =
        normalize_isbn(isbn).ok_or_else(|| JobError::InvalidIsbn(isbn.trim().to_string()))?;

    let job_id = Uuid::new_v4();
    let (handle, ticket) = open_job(&deps, job_id, JobPipeline::SingleEnrichment, 1).await?;

    tokio::spawn(async move {
        run_single(deps, handle, normalized).await;
    });
    Ok(ticket)
}

async fn run_single(deps: PipelineDeps, handle: ProgressHandle, isbn: String) {
    await_ready(&deps, &handle).await;

    let _ = handle
        .update_progress(0.1, 0, json!({ "progress": 0.1, "message": "Fetching providers…" }))
        .await;

    match deps.enricher.enrich_by_isbn(&isbn).await {
        Ok(outcome) => {
            let _ = handle
                .update_progress(0.9, 1, json!({ "progress": 0.9, "message": "Merging…" }))
                .await;
            let payload = json!({
                "data": outcome.response,
                "provider": outcome.provider,
                "cached": outcome.cached,
            });
            if let Err(e) = handle.complete(payload).await {
                warn!(job_id = %handle.job_id(), error = %e, "single enrichment completion rejected");
            }
        }
        // Unreachable for a pre-validated ISBN, but the pipeline still
        // reports rather than panics.
        Err(EnrichError::InvalidIsbn(_) | EnrichError::InvalidQuery(_)) => {
            let _ = handle
                .send_error(error_payload(
                    bookdex_core::error::ErrorCode::InvalidIsbn,
                    "ISBN failed validation",
                    false,
                ))
                .await;
        }
    }
}
