//! Job-start and job-management handlers.

use crate::dto::{
    BatchRequest, BookshelfScanRequest, CsvImportRequest, JobAccepted, RefreshTokenRequest,
    SingleEnrichRequest,
};
use crate::envelope::{ApiEnvelope, ResponseMeta};
use crate::error::HttpError;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use bookdex_core::job::JobState;
use bookdex_jobs::{
    JobTicket, start_batch_enrichment, start_bookshelf_scan, start_csv_import,
    start_single_enrichment,
};
use serde_json::json;
use std::time::Instant;
use uuid::Uuid;

fn accepted(ticket: &JobTicket, started: Instant) -> (StatusCode, Json<ApiEnvelope<JobAccepted>>) {
    let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let body = ApiEnvelope::success(JobAccepted::from_ticket(ticket), ResponseMeta::new(elapsed));
    (StatusCode::ACCEPTED, Json(body))
}

/// `POST /api/enrich/batch`: 202 with the connection ticket.
pub async fn start_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchRequest>,
) -> Result<(StatusCode, Json<ApiEnvelope<JobAccepted>>), HttpError> {
    let started = Instant::now();
    let ticket = start_batch_enrichment(state.jobs.clone(), request.books).await?;
    Ok(accepted(&ticket, started))
}

/// `POST /api/import/csv`
pub async fn start_csv(
    State(state): State<AppState>,
    Json(request): Json<CsvImportRequest>,
) -> Result<(StatusCode, Json<ApiEnvelope<JobAccepted>>), HttpError> {
    let started = Instant::now();
    let ticket = start_csv_import(state.jobs.clone(), request.csv_content).await?;
    Ok(accepted(&ticket, started))
}

/// `POST /api/scan/bookshelf`
pub async fn start_scan(
    State(state): State<AppState>,
    Json(request): Json<BookshelfScanRequest>,
) -> Result<(StatusCode, Json<ApiEnvelope<JobAccepted>>), HttpError> {
    let started = Instant::now();
    let ticket = start_bookshelf_scan(state.jobs.clone(), request.images).await?;
    Ok(accepted(&ticket, started))
}

/// `POST /api/enrich/single`
pub async fn start_single(
    State(state): State<AppState>,
    Json(request): Json<SingleEnrichRequest>,
) -> Result<(StatusCode, Json<ApiEnvelope<JobAccepted>>), HttpError> {
    let started = Instant::now();
    let ticket = start_single_enrichment(state.jobs.clone(), &request.isbn).await?;
    Ok(accepted(&ticket, started))
}

/// `GET /api/jobs/:id`, the reconnect path: current persisted job state.
pub async fn job_state(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ApiEnvelope<JobState>>, HttpError> {
    let started = Instant::now();
    let handle = state.jobs.registry.lookup(job_id);
    let job = handle.get_job_state().await.map_err(HttpError::from)?;
    let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    Ok(Json(ApiEnvelope::success(job, ResponseMeta::new(elapsed))))
}

/// `POST /api/jobs/:id/cancel`
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ApiEnvelope<serde_json::Value>>, HttpError> {
    let started = Instant::now();
    let handle = state.jobs.registry.lookup(job_id);
    let outcome = handle
        .cancel(Some("Cancelled by client".to_string()))
        .await
        .map_err(HttpError::from)?;
    let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    Ok(Json(ApiEnvelope::success(
        json!({ "cancelled": true, "alreadyCancelled": outcome.already }),
        ResponseMeta::new(elapsed),
    )))
}

/// `POST /api/jobs/:id/refresh-token`
pub async fn refresh_token(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<ApiEnvelope<serde_json::Value>>, HttpError> {
    let started = Instant::now();
    let handle = state.jobs.registry.lookup(job_id);
    let grant = handle.refresh_token(&request.token).await.map_err(HttpError::from)?;
    let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    Ok(Json(ApiEnvelope::success(
        json!({ "token": grant.token, "expiresIn": grant.expires_in_seconds }),
        ResponseMeta::new(elapsed),
    )))
}
