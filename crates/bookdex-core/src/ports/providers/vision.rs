//! Multimodal-model port: bookshelf scans and CSV understanding.

use super::outcome::ProviderResponse;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A photo handed to the model, either inline or by reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImageSource {
    /// Base64-encoded image bytes.
    Base64 { data: String },
    /// Publicly fetchable image URL.
    Url { url: String },
}

/// One book the model recognized on a shelf photo.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScannedBook {
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    /// Model confidence in [0, 1], when reported.
    pub confidence: Option<f64>,
}

/// Everything the model extracted from one shelf photo.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShelfScanPayload {
    #[serde(default)]
    pub books: Vec<ScannedBook>,
}

/// One raw CSV row as the model understood it. Fields are optional because
/// the model reports what it saw; filtering is the pipeline's job.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvRow {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
}

/// Parsed CSV export.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvParsePayload {
    #[serde(default)]
    pub rows: Vec<CsvRow>,
}

/// Port for the multimodal model.
#[async_trait]
pub trait VisionModelPort: Send + Sync {
    /// Extract book spines from a shelf photo.
    async fn scan_image(&self, image: &ImageSource) -> ProviderResponse<ShelfScanPayload>;

    /// Parse a raw CSV export into structured rows.
    async fn parse_csv(&self, csv_text: &str) -> ProviderResponse<CsvParsePayload>;
}
