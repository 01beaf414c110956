//! Volume-catalog provider port: typed DTOs and operations.
//!
//! The raw response is parsed into these records at the client boundary;
//! free-form JSON never crosses the port.

use super::outcome::ProviderResponse;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One catalog volume, as the provider describes it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeHit {
    pub volume_id: String,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    pub publisher: Option<String>,
    /// ISO date or bare year, verbatim from the provider.
    pub published_date: Option<String>,
    pub description: Option<String>,
    pub page_count: Option<u32>,
    #[serde(default)]
    pub categories: Vec<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub isbn_10s: Vec<String>,
    #[serde(default)]
    pub isbn_13s: Vec<String>,
    /// Thumbnail URL; the largest image the provider offers for this volume.
    pub thumbnail: Option<String>,
    /// Loose format hint such as "BOOK" or "Hardcover".
    pub format_hint: Option<String>,
}

/// Result page for a catalog search.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeSearchPayload {
    pub total_items: u32,
    #[serde(default)]
    pub items: Vec<VolumeHit>,
}

/// Port for the commercial volume catalog.
#[async_trait]
pub trait VolumeCatalogPort: Send + Sync {
    /// Free-text search across titles, authors, and descriptions.
    async fn search_by_free_text(
        &self,
        query: &str,
        max_results: u32,
    ) -> ProviderResponse<VolumeSearchPayload>;

    /// Exact-ISBN search.
    async fn search_by_isbn(&self, isbn: &str) -> ProviderResponse<VolumeSearchPayload>;

    /// Direct volume lookup by provider id.
    async fn search_by_volume_id(&self, volume_id: &str) -> ProviderResponse<VolumeHit>;
}
