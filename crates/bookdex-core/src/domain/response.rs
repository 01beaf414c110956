//! Merged enrichment response: the unit every orchestrator operation returns.

use super::author::Author;
use super::edition::Edition;
use super::provider::ProviderId;
use super::work::Work;
use serde::{Deserialize, Serialize};

/// Where a cached response was served from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheSource {
    Edge,
    Kv,
}

impl CacheSource {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Edge => "edge",
            Self::Kv => "kv",
        }
    }
}

/// Canonical works/editions/authors produced by one enrichment operation.
///
/// An empty response is still a success: total provider failure degrades
/// the result's completeness, never the status.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichedResponse {
    pub works: Vec<Work>,
    pub editions: Vec<Edition>,
    pub authors: Vec<Author>,
}

impl EnrichedResponse {
    /// True when no provider contributed anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.works.is_empty() && self.editions.is_empty() && self.authors.is_empty()
    }

    /// Best merged quality across all records, 0-100.
    #[must_use]
    pub fn merged_quality(&self) -> u8 {
        self.works
            .iter()
            .map(|w| w.quality)
            .chain(self.editions.iter().map(|e| e.quality))
            .max()
            .unwrap_or(0)
    }
}

/// Response plus the serving metadata handlers surface in the envelope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichOutcome {
    #[serde(flatten)]
    pub response: EnrichedResponse,
    /// Primary provider of the merged result; `None` when every provider
    /// failed (serialized as `"none"` in envelope metadata).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderId>,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_source: Option<CacheSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_seconds: Option<u64>,
}

impl EnrichOutcome {
    /// Wrap a freshly computed (non-cached) response.
    #[must_use]
    pub const fn fresh(response: EnrichedResponse, provider: Option<ProviderId>) -> Self {
        Self {
            response,
            provider,
            cached: false,
            cache_source: None,
            age_seconds: None,
        }
    }
}
