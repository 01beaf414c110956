//! Cache entry and hit annotation types.

use bookdex_core::domain::{CacheSource, ProviderId};
use serde::{Deserialize, Serialize};

/// One immutable cache entry. Entries are replace-only: re-writing a key
/// swaps the whole entry atomically, nothing mutates in place.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub payload: serde_json::Value,
    /// Epoch milliseconds at write time.
    pub cached_at_ms: i64,
    pub ttl_seconds: u64,
    /// Primary provider of the cached result, when one exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderId>,
    /// Merged quality of the cached result, 0-100.
    pub quality: u8,
}

impl CacheEntry {
    #[must_use]
    pub fn new(
        payload: serde_json::Value,
        ttl_seconds: u64,
        provider: Option<ProviderId>,
        quality: u8,
        now_ms: i64,
    ) -> Self {
        Self { payload, cached_at_ms: now_ms, ttl_seconds, provider, quality }
    }

    #[must_use]
    pub const fn age_seconds(&self, now_ms: i64) -> u64 {
        let age_ms = now_ms - self.cached_at_ms;
        if age_ms < 0 { 0 } else { (age_ms / 1000) as u64 }
    }

    #[must_use]
    pub const fn is_expired(&self, now_ms: i64) -> bool {
        self.age_seconds(now_ms) >= self.ttl_seconds
    }
}

/// A cache hit, annotated with the tier that served it.
#[derive(Clone, Debug, PartialEq)]
pub struct CacheHit {
    pub entry: CacheEntry,
    pub source: CacheSource,
    pub age_seconds: u64,
}
