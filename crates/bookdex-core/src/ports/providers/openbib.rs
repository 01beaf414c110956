//! Open bibliographic database port: typed DTOs and operations.

use super::outcome::ProviderResponse;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One document from the open bibliographic database.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenBibDoc {
    /// Provider record key, e.g. `/works/OL82563W`.
    pub key: String,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    #[serde(default)]
    pub author_names: Vec<String>,
    pub first_publish_year: Option<i32>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub isbns: Vec<String>,
    #[serde(default)]
    pub publishers: Vec<String>,
    #[serde(default)]
    pub publish_dates: Vec<String>,
    /// Numeric cover id in the provider's image service.
    pub cover_id: Option<i64>,
    pub number_of_pages: Option<u32>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub edition_keys: Vec<String>,
}

/// Result page for a bibliographic search.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenBibSearchPayload {
    pub num_found: u32,
    #[serde(default)]
    pub docs: Vec<OpenBibDoc>,
}

/// Port for the open bibliographic database.
#[async_trait]
pub trait OpenBibPort: Send + Sync {
    /// Free-text search over works.
    async fn search(&self, query: &str, limit: u32) -> ProviderResponse<OpenBibSearchPayload>;

    /// Direct edition lookup by ISBN. `None` payload means the ISBN is
    /// unknown to the provider (a successful miss, not a failure).
    async fn lookup_isbn(&self, isbn: &str) -> ProviderResponse<Option<OpenBibDoc>>;
}
