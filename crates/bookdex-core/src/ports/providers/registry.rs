//! ISBN-registry port: typed DTOs and operations.
//!
//! The registry is the fallback provider; in the merge it mostly
//! contributes cover images and fills gaps the ranked providers left.

use super::outcome::ProviderResponse;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One registry record for an ISBN.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryBook {
    pub isbn13: Option<String>,
    pub isbn10: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    pub publisher: Option<String>,
    pub date_published: Option<String>,
    pub pages: Option<u32>,
    /// Binding string, e.g. "Hardcover" or "Trade Paperback".
    pub binding: Option<String>,
    pub language: Option<String>,
    pub cover_url: Option<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
}

/// Port for the ISBN registry.
#[async_trait]
pub trait IsbnRegistryPort: Send + Sync {
    /// Lookup by ISBN. `None` payload means the ISBN is not registered
    /// (a successful miss, not a failure).
    async fn lookup_isbn(&self, isbn: &str) -> ProviderResponse<Option<RegistryBook>>;
}
