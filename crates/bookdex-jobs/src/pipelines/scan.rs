//! Bookshelf-scan pipeline: one multimodal-model call per photo, per-photo
//! status tracked in the job's pipeline state.

use super::{PipelineDeps, JobTicket, await_ready, open_job};
use crate::actor::{PhotoStatus, ProgressHandle};
use crate::error::JobError;
use bookdex_core::job::JobPipeline;
use bookdex_core::ports::providers::ImageSource;
use futures_util::future::join_all;
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::Semaphore;
use tracing::warn;
use uuid::Uuid;

/// Start a bookshelf-scan job.
pub async fn start_bookshelf_scan(
    deps: PipelineDeps,
    images: Vec<ImageSource>,
) -> Result<JobTicket, JobError> {
    if images.is_empty() {
        return Err(JobError::EmptyBatch);
    }

    let job_id = Uuid::new_v4();
    let total = u32::try_from(images.len()).unwrap_or(u32::MAX);
    let (handle, ticket) = open_job(&deps, job_id, JobPipeline::BookshelfScan, total).await?;

    tokio::spawn(async move {
        run_scan(deps, handle, images).await;
    });
    Ok(ticket)
}

async fn run_scan(deps: PipelineDeps, handle: ProgressHandle, images: Vec<ImageSource>) {
    await_ready(&deps, &handle).await;

    let total = u32::try_from(images.len()).unwrap_or(u32::MAX);
    if let Err(e) = handle.init_batch(total).await {
        warn!(job_id = %handle.job_id(), error = %e, "init_batch failed");
        return;
    }
    let _ = handle
        .update_progress(
            0.0,
            0,
            json!({ "progress": 0.0, "processedCount": 0, "totalCount": total }),
        )
        .await;

    let slots = Arc::new(Semaphore::new(deps.config.batch_concurrency.max(1)));
    let done = Arc::new(AtomicU32::new(0));

    // Photos scan concurrently; the actor serializes the per-index status
    // updates so they cannot race each other.
    let scans = images.into_iter().enumerate().map(|(index, image)| {
        let deps = deps.clone();
        let handle = handle.clone();
        let slots = Arc::clone(&slots);
        let done = Arc::clone(&done);
        async move {
            if handle.is_cancelled().await {
                return (index, 0_u32, Vec::new());
            }
            let _permit = slots.acquire().await.ok();

            let response = deps.vision.scan_image(&image).await;
            let (status, books) = match response.outcome {
                Ok(payload) => (PhotoStatus::Completed, payload.books),
                Err(failure) => {
                    warn!(job_id = %handle.job_id(), index, error = %failure, "photo scan failed");
                    (PhotoStatus::Failed, Vec::new())
                }
            };
            let found = u32::try_from(books.len()).unwrap_or(u32::MAX);
            if let Err(e) = handle.update_photo(index, status, found, None).await {
                warn!(job_id = %handle.job_id(), index, error = %e, "photo update rejected");
            }

            let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
            let _ = handle
                .update_progress(
                    f64::from(finished) / f64::from(total.max(1)),
                    finished,
                    json!({
                        "progress": f64::from(finished) / f64::from(total.max(1)),
                        "processedCount": finished,
                        "totalCount": total,
                        "photoIndex": index,
                    }),
                )
                .await;
            (index, found, books)
        }
    });
    let results = join_all(scans).await;

    if handle.is_cancelled().await {
        let _ = handle.cancel(None).await;
        return;
    }

    let total_books_found: u32 = results.iter().map(|(_, found, _)| *found).sum();
    let books: Vec<serde_json::Value> = results
        .iter()
        .flat_map(|(_, _, books)| books.iter())
        .map(|book| {
            json!({
                "title": book.title,
                "author": book.author,
                "isbn": book.isbn,
                "confidence": book.confidence,
            })
        })
        .collect();

    // The authoritative per-photo array lives in the actor's state.
    let photos = handle
        .get_job_state()
        .await
        .map(|state| state.pipeline_state["photos"].clone())
        .unwrap_or(serde_json::Value::Null);

    let payload = json!({
        "photos": photos,
        "totalBooksFound": total_books_found,
        "books": books,
    });
    if let Err(e) = handle.complete(payload).await {
        warn!(job_id = %handle.job_id(), error = %e, "scan completion rejected");
    }
}
