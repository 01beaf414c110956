//! CSV-import pipeline: a generative model turns a raw library export into
//! structured book rows.

use super::{PipelineDeps, JobTicket, await_ready, error_payload, open_job};
use crate::actor::ProgressHandle;
use crate::error::JobError;
use bookdex_cache::{CacheKey, FetchedValue};
use bookdex_core::domain::ProviderId;
use bookdex_core::error::ErrorCode;
use bookdex_core::job::JobPipeline;
use bookdex_core::normalize::sha256_hex;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

/// Separators we recognize as "this is probably a CSV".
const SEPARATORS: [char; 4] = [',', ';', '\t', '|'];

/// Library exports top out well under this; anything bigger is not a CSV
/// we want to ship to the model.
const MAX_CSV_BYTES: usize = 1_000_000;

/// Start a CSV-import job.
pub async fn start_csv_import(deps: PipelineDeps, csv_text: String) -> Result<JobTicket, JobError> {
    if csv_text.len() > MAX_CSV_BYTES {
        return Err(JobError::FileTooLarge {
            actual_bytes: csv_text.len(),
            max_bytes: MAX_CSV_BYTES,
        });
    }

    let job_id = Uuid::new_v4();
    let (handle, ticket) = open_job(&deps, job_id, JobPipeline::CsvImport, 0).await?;

    tokio::spawn(async move {
        run_csv(deps, handle, csv_text).await;
    });
    Ok(ticket)
}

async fn run_csv(deps: PipelineDeps, handle: ProgressHandle, csv_text: String) {
    await_ready(&deps, &handle).await;

    let _ = handle
        .update_progress(0.02, 0, json!({ "progress": 0.02, "message": "Validating…" }))
        .await;

    let trimmed = csv_text.trim();
    if trimmed.is_empty() || !has_recognizable_separator(trimmed) {
        let _ = handle
            .send_error(error_payload(
                ErrorCode::CsvProcessingFailed,
                "Input does not look like a CSV export",
                false,
            ))
            .await;
        return;
    }

    // Content-addressed cache: the same file parses once per day no matter
    // how many times it is uploaded.
    let key = CacheKey::csv_parse(&sha256_hex(trimmed));
    if let Some(hit) = deps.cache.get(&key).await {
        info!(job_id = %handle.job_id(), "csv parse served from cache");
        let processed = hit.entry.payload["books"]
            .as_array()
            .map_or(0, Vec::len);
        let _ = handle
            .update_progress(
                0.9,
                u32::try_from(processed).unwrap_or(u32::MAX),
                json!({ "progress": 0.9, "message": "Loaded cached parse" }),
            )
            .await;
        let _ = handle.complete(hit.entry.payload).await;
        return;
    }

    let _ = handle
        .update_progress(0.05, 0, json!({ "progress": 0.05, "message": "Uploading to model…" }))
        .await;

    let response = deps.vision.parse_csv(trimmed).await;
    let payload = match response.outcome {
        Ok(payload) => payload,
        Err(failure) => {
            // Model rate-limit/quota messages are surfaced intact.
            let _ = handle
                .send_error(error_payload(
                    ErrorCode::CsvProcessingFailed,
                    &failure.message,
                    failure.kind.is_retryable(),
                ))
                .await;
            return;
        }
    };

    let total_rows = payload.rows.len();
    let books: Vec<serde_json::Value> = payload
        .rows
        .into_iter()
        .filter_map(|row| {
            // Rows missing title or author are dropped; whitespace is
            // trimmed; the optional ISBN is preserved as given.
            let title = row.title.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
            let author = row.author.as_deref().map(str::trim).filter(|a| !a.is_empty())?;
            let isbn = row.isbn.as_deref().map(str::trim).filter(|i| !i.is_empty());
            Some(json!({ "title": title, "author": author, "isbn": isbn }))
        })
        .collect();

    if books.is_empty() {
        let _ = handle
            .send_error(error_payload(ErrorCode::CsvProcessingFailed, "No valid books found", false))
            .await;
        return;
    }

    let kept = books.len();
    let _ = handle
        .update_progress(
            0.75,
            u32::try_from(kept).unwrap_or(u32::MAX),
            json!({ "progress": 0.75, "message": format!("Parsed {kept} books") }),
        )
        .await;

    let result = json!({
        "books": books,
        "errors": [],
        "successRate": format!("{kept}/{total_rows}"),
    });
    deps.cache.put(
        &key,
        FetchedValue {
            payload: result.clone(),
            provider: Some(ProviderId::VisionModel),
            quality: 100,
            ttl_seconds: deps.config.cache_ttls.csv,
        },
    );

    if let Err(e) = handle.complete(result).await {
        warn!(job_id = %handle.job_id(), error = %e, "csv completion rejected");
    }
}

fn has_recognizable_separator(text: &str) -> bool {
    text.lines()
        .next()
        .is_some_and(|first| first.contains(SEPARATORS))
}
