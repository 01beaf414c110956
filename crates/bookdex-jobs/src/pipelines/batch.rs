//! Batch-enrichment pipeline.

use super::{PipelineDeps, JobTicket, await_ready, open_job};
use crate::actor::ProgressHandle;
use crate::error::JobError;
use bookdex_core::job::JobPipeline;
use bookdex_enrich::BookQuery;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;
use uuid::Uuid;

/// Start a batch-enrichment job. Returns the connection ticket immediately;
/// the work runs in a background task.
pub async fn start_batch_enrichment(
    deps: PipelineDeps,
    books: Vec<BookQuery>,
) -> Result<JobTicket, JobError> {
    if books.is_empty() {
        return Err(JobError::EmptyBatch);
    }

    let job_id = Uuid::new_v4();
    let total = u32::try_from(books.len()).unwrap_or(u32::MAX);
    let (handle, ticket) = open_job(&deps, job_id, JobPipeline::BatchEnrichment, total).await?;

    tokio::spawn(async move {
        run_batch(deps, handle, books).await;
    });
    Ok(ticket)
}

async fn run_batch(deps: PipelineDeps, handle: ProgressHandle, books: Vec<BookQuery>) {
    await_ready(&deps, &handle).await;

    let deadline = Duration::from_millis(deps.config.batch_timeout_ms);
    if tokio::time::timeout(deadline, batch_work(&deps, &handle, books))
        .await
        .is_err()
    {
        // Deadline expiry propagates as a regular cancellation-with-reason.
        if let Err(e) = handle.cancel(Some("Batch timed out".to_string())).await {
            warn!(job_id = %handle.job_id(), error = %e, "batch timeout cancel failed");
        }
    }
}

async fn batch_work(deps: &PipelineDeps, handle: &ProgressHandle, books: Vec<BookQuery>) {
    let total = u32::try_from(books.len()).unwrap_or(u32::MAX);
    let _ = handle
        .update_progress(
            0.0,
            0,
            json!({ "progress": 0.0, "processedCount": 0, "totalCount": total }),
        )
        .await;

    let slots = Arc::new(Semaphore::new(deps.config.batch_concurrency.max(1)));
    let processed = Arc::new(AtomicU32::new(0));
    let mut tasks: JoinSet<bookdex_enrich::BookResult> = JoinSet::new();
    let mut cancelled = false;

    for book in books {
        let Ok(permit) = Arc::clone(&slots).acquire_owned().await else {
            break;
        };
        // Poll the cancellation flag immediately before every launch;
        // in-flight enrichments are allowed to finish.
        if handle.is_cancelled().await {
            cancelled = true;
            break;
        }

        let enricher = Arc::clone(&deps.enricher);
        let handle = handle.clone();
        let processed = Arc::clone(&processed);
        tasks.spawn(async move {
            let _permit = permit;
            // Same ISBN within the batch collapses to one provider fetch:
            // identical cache keys share a single-flight slot.
            let query = book.clone();
            let mut results = enricher.enrich_multiple(vec![book]).await;
            let result = results.pop().unwrap_or_else(|| bookdex_enrich::BookResult {
                query,
                result: Err("enrichment returned no result".to_string()),
            });

            let done = processed.fetch_add(1, Ordering::SeqCst) + 1;
            let _ = handle
                .update_progress(
                    f64::from(done) / f64::from(total.max(1)),
                    done,
                    json!({
                        "progress": f64::from(done) / f64::from(total.max(1)),
                        "processedCount": done,
                        "totalCount": total,
                        "currentBook": result.query.title,
                    }),
                )
                .await;
            result
        });
    }

    let mut enriched = Vec::new();
    let mut errors = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(result) => match result.result {
                Ok(outcome) => enriched.push(json!({
                    "query": result.query,
                    "data": outcome.response,
                })),
                Err(message) => errors.push(json!({
                    "query": result.query,
                    "error": message,
                })),
            },
            Err(e) => {
                warn!(job_id = %handle.job_id(), error = %e, "batch task panicked");
                errors.push(json!({ "error": "internal task failure" }));
            }
        }
    }

    if cancelled || handle.is_cancelled().await {
        // The cancel RPC already moved the status; this is the idempotent
        // confirmation after in-flight work drained.
        let _ = handle.cancel(None).await;
        return;
    }

    let payload = json!({
        "books": enriched,
        "errors": errors,
        "processedCount": total,
        "totalCount": total,
    });
    if let Err(e) = handle.complete(payload).await {
        warn!(job_id = %handle.job_id(), error = %e, "batch completion rejected");
    }
}
