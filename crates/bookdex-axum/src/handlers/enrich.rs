//! Synchronous enrichment handlers.

use crate::dto::{AdvancedSearchQuery, EditionsQuery, SearchQuery};
use crate::envelope::{ApiEnvelope, ResponseMeta};
use crate::error::HttpError;
use crate::state::AppState;
use axum::Json;
use axum::extract::{Path, Query, State};
use bookdex_core::domain::{EnrichOutcome, EnrichedResponse};
use bookdex_enrich::AdvancedQuery;
use std::time::Instant;

fn respond(
    outcome: EnrichOutcome,
    started: Instant,
) -> Json<ApiEnvelope<EnrichedResponse>> {
    let elapsed = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let meta = ResponseMeta::for_outcome(&outcome, elapsed);
    Json(ApiEnvelope::success(outcome.response, meta))
}

/// `GET /api/enrich/isbn/:isbn`
pub async fn enrich_by_isbn(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
) -> Result<Json<ApiEnvelope<EnrichedResponse>>, HttpError> {
    let started = Instant::now();
    let outcome = state.enricher.enrich_by_isbn(&isbn).await?;
    Ok(respond(outcome, started))
}

/// `GET /api/search/title?q=...`
pub async fn search_by_title(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiEnvelope<EnrichedResponse>>, HttpError> {
    let started = Instant::now();
    let outcome = state.enricher.enrich_by_title(&query.q).await?;
    Ok(respond(outcome, started))
}

/// `GET /api/search/author?q=...`
pub async fn search_by_author(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiEnvelope<EnrichedResponse>>, HttpError> {
    let started = Instant::now();
    let outcome = state.enricher.enrich_by_author(&query.q).await?;
    Ok(respond(outcome, started))
}

/// `GET /api/search/advanced?title=&author=&year=&publisher=`
pub async fn search_advanced(
    State(state): State<AppState>,
    Query(query): Query<AdvancedSearchQuery>,
) -> Result<Json<ApiEnvelope<EnrichedResponse>>, HttpError> {
    let started = Instant::now();
    let outcome = state
        .enricher
        .enrich_advanced(AdvancedQuery {
            title: query.title,
            author: query.author,
            year: query.year,
            publisher: query.publisher,
        })
        .await?;
    Ok(respond(outcome, started))
}

/// `GET /api/works/:title/editions?author=&limit=`
pub async fn list_editions(
    State(state): State<AppState>,
    Path(title): Path<String>,
    Query(query): Query<EditionsQuery>,
) -> Result<Json<ApiEnvelope<EnrichedResponse>>, HttpError> {
    let started = Instant::now();
    let outcome = state
        .enricher
        .enrich_editions(&title, &query.author, query.limit)
        .await?;
    Ok(respond(outcome, started))
}
