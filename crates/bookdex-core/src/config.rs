//! Service configuration.
//!
//! One explicit struct instead of ambient environment access: the composition
//! root builds a `CoreConfig` (env overrides applied by the CLI) and every
//! component receives the slice of it that it needs.

use serde::{Deserialize, Serialize};

/// TTLs per cache data class, in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheTtls {
    /// ISBN lookups: effectively immutable data.
    pub isbn: u64,
    /// Title/author searches.
    pub title: u64,
    /// Multi-field advanced searches: most volatile query class.
    pub advanced: u64,
    /// Content-addressed CSV parse results.
    pub csv: u64,
    /// Merged enrichment responses of quality >= 70.
    pub enrich_high: u64,
    /// Merged enrichment responses of quality < 70.
    pub enrich_low: u64,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            isbn: 365 * 24 * 3600,
            title: 7 * 24 * 3600,
            advanced: 6 * 3600,
            csv: 24 * 3600,
            enrich_high: 24 * 3600,
            enrich_low: 3600,
        }
    }
}

/// Recognized configuration options with their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Hard deadline for every provider operation, milliseconds.
    pub provider_timeout_ms: u64,
    /// Fixed rate-limit window length, seconds.
    pub rate_window_seconds: u64,
    /// Admits per window per key.
    pub rate_max_requests: u32,
    /// How long a pipeline waits for the client's `ready` frame.
    pub ready_handshake_timeout_ms: u64,
    /// Overall deadline for a batch-enrichment run, milliseconds.
    pub batch_timeout_ms: u64,
    /// Concurrent enrichments inside one batch.
    pub batch_concurrency: usize,
    /// Checkpoint after this many accepted updates...
    pub checkpoint_every_n_updates: u32,
    /// ...or after this many seconds since the last checkpoint.
    pub checkpoint_every_seconds: u64,
    /// Delay before a terminal job's persisted state is deleted.
    pub cleanup_after_terminal_hours: u64,
    pub cache_ttls: CacheTtls,
    /// Capability-token lifetime, seconds.
    pub token_lifetime_seconds: u64,
    /// Tokens may only be refreshed in this final window of their life.
    pub token_refresh_window_seconds: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            provider_timeout_ms: 5_000,
            rate_window_seconds: 60,
            rate_max_requests: 10,
            ready_handshake_timeout_ms: 10_000,
            batch_timeout_ms: 1_800_000,
            batch_concurrency: 5,
            checkpoint_every_n_updates: 5,
            checkpoint_every_seconds: 10,
            cleanup_after_terminal_hours: 24,
            cache_ttls: CacheTtls::default(),
            token_lifetime_seconds: 7_200,
            token_refresh_window_seconds: 1_800,
        }
    }
}

impl CoreConfig {
    /// Enrichment TTL for a merged result of the given quality (0-100).
    #[must_use]
    pub const fn enrich_ttl_for_quality(&self, quality: u8) -> u64 {
        if quality >= 70 { self.cache_ttls.enrich_high } else { self.cache_ttls.enrich_low }
    }
}
