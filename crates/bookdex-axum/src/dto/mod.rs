//! Request and response DTOs for the HTTP surface.

use bookdex_core::ports::providers::ImageSource;
use bookdex_enrich::BookQuery;
use bookdex_jobs::JobTicket;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `POST /api/enrich/batch`
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub books: Vec<BookQuery>,
}

/// `POST /api/import/csv`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvImportRequest {
    pub csv_content: String,
}

/// `POST /api/scan/bookshelf`
#[derive(Debug, Deserialize)]
pub struct BookshelfScanRequest {
    pub images: Vec<ImageSource>,
}

/// `POST /api/enrich/single`
#[derive(Debug, Deserialize)]
pub struct SingleEnrichRequest {
    pub isbn: String,
}

/// `POST /api/jobs/:id/refresh-token`
#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub token: String,
}

/// Search query string: `?q=...`
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// `GET /api/search/advanced` query string.
#[derive(Debug, Deserialize)]
pub struct AdvancedSearchQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    pub year: Option<i32>,
    pub publisher: Option<String>,
}

/// `GET /api/works/:title/editions` query string.
#[derive(Debug, Deserialize)]
pub struct EditionsQuery {
    #[serde(default)]
    pub author: String,
    pub limit: Option<u32>,
}

/// 202 body for every job-start endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAccepted {
    pub job_id: Uuid,
    pub token: String,
    pub total_count: u32,
    pub websocket_url: String,
    pub status_url: String,
}

impl JobAccepted {
    #[must_use]
    pub fn from_ticket(ticket: &JobTicket) -> Self {
        Self {
            job_id: ticket.job_id,
            token: ticket.token.clone(),
            total_count: ticket.total_count,
            websocket_url: format!(
                "/ws/progress?jobId={}&token={}",
                ticket.job_id, ticket.token
            ),
            status_url: format!("/api/jobs/{}", ticket.job_id),
        }
    }
}
