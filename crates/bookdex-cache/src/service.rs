//! Two-tier cache service with per-process single-flight.
//!
//! Lookup order is edge then KV; writes go to KV with best-effort edge
//! population, and the write happens in a background task so the response
//! path never waits on it. Concurrent `get_or_fetch` callers for the same
//! key share one in-flight fetch: the first caller becomes the leader and
//! executes the fetcher, everyone else awaits the leader's broadcast.

use crate::entry::{CacheEntry, CacheHit};
use crate::error::{CacheError, FetchError};
use crate::key::CacheKey;
use crate::tier::CacheTier;
use bookdex_core::domain::{CacheSource, ProviderId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// A freshly fetched value, with the metadata needed to cache it.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchedValue {
    pub payload: serde_json::Value,
    pub provider: Option<ProviderId>,
    pub quality: u8,
    pub ttl_seconds: u64,
}

/// Result of `get_or_fetch`.
#[derive(Clone, Debug, PartialEq)]
pub enum GetOrFetch {
    /// Served from a cache tier.
    Cached(CacheHit),
    /// Computed by this call (or by a concurrent leader for the same key).
    Fresh(FetchedValue),
}

type InflightSender = broadcast::Sender<Result<FetchedValue, FetchError>>;

/// Removes a key's single-flight slot when the leader finishes or is
/// dropped mid-fetch.
struct FlightGuard<'a> {
    inflight: &'a Mutex<HashMap<String, InflightSender>>,
    key: String,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut inflight) = self.inflight.lock() {
            inflight.remove(&self.key);
        }
    }
}

/// The two-tier cache.
pub struct Cache {
    edge: Arc<dyn CacheTier>,
    kv: Arc<dyn CacheTier>,
    inflight: Mutex<HashMap<String, InflightSender>>,
}

impl Cache {
    #[must_use]
    pub fn new(edge: Arc<dyn CacheTier>, kv: Arc<dyn CacheTier>) -> Self {
        Self { edge, kv, inflight: Mutex::new(HashMap::new()) }
    }

    /// Look up a key across both tiers. Tier failures degrade to a miss.
    pub async fn get(&self, key: &CacheKey) -> Option<CacheHit> {
        let now_ms = chrono::Utc::now().timestamp_millis();

        match self.edge.get(key.as_str()).await {
            Ok(Some(entry)) => {
                let age_seconds = entry.age_seconds(now_ms);
                return Some(CacheHit { entry, source: CacheSource::Edge, age_seconds });
            }
            Ok(None) => {}
            Err(e) => warn!(key = %key, error = %e, "edge tier read failed, treating as miss"),
        }

        match self.kv.get(key.as_str()).await {
            Ok(Some(entry)) => {
                // Best-effort edge population so the next read is local.
                let edge = Arc::clone(&self.edge);
                let backfill_key = key.as_str().to_string();
                let backfill = entry.clone();
                tokio::spawn(async move {
                    if let Err(e) = edge.put(&backfill_key, backfill).await {
                        debug!(key = %backfill_key, error = %e, "edge backfill failed");
                    }
                });

                let age_seconds = entry.age_seconds(now_ms);
                Some(CacheHit { entry, source: CacheSource::Kv, age_seconds })
            }
            Ok(None) => None,
            Err(e) => {
                warn!(key = %key, error = %e, "kv tier read failed, treating as miss");
                None
            }
        }
    }

    /// Store a value. The write runs in a background task; this call returns
    /// immediately and never fails the caller.
    pub fn put(&self, key: &CacheKey, value: FetchedValue) {
        let entry = CacheEntry::new(
            value.payload,
            value.ttl_seconds,
            value.provider,
            value.quality,
            chrono::Utc::now().timestamp_millis(),
        );
        let edge = Arc::clone(&self.edge);
        let kv = Arc::clone(&self.kv);
        let key = key.as_str().to_string();

        tokio::spawn(async move {
            if let Err(e) = kv.put(&key, entry.clone()).await {
                warn!(key = %key, error = %e, "kv write-through failed");
            }
            if let Err(e) = edge.put(&key, entry).await {
                debug!(key = %key, error = %e, "edge write-through failed");
            }
        });
    }

    /// Cached read with single-flight fetch on miss.
    ///
    /// At most one concurrent `fetcher` invocation runs per key per process;
    /// concurrent callers share the leader's result. Fetch failures propagate
    /// to every waiter and are never cached. Successful fetches are cached
    /// via background write-through.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &CacheKey,
        fetcher: F,
    ) -> Result<GetOrFetch, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<FetchedValue, FetchError>>,
    {
        if let Some(hit) = self.get(key).await {
            return Ok(GetOrFetch::Cached(hit));
        }

        // Join an in-flight fetch for this key, or become the leader.
        let mut follower_rx = None;
        let leader_tx = {
            let mut inflight = self.inflight.lock().unwrap();
            if let Some(tx) = inflight.get(key.as_str()) {
                follower_rx = Some(tx.subscribe());
                None
            } else {
                let (tx, _) = broadcast::channel(1);
                inflight.insert(key.as_str().to_string(), tx.clone());
                Some(tx)
            }
        };

        if let Some(mut rx) = follower_rx {
            return match rx.recv().await {
                Ok(Ok(value)) => Ok(GetOrFetch::Fresh(value)),
                Ok(Err(e)) => Err(e),
                // Leader dropped without broadcasting (cancelled mid-fetch).
                Err(_) => Err(FetchError("shared fetch aborted".to_string())),
            };
        }

        let Some(tx) = leader_tx else {
            // Both branches above set exactly one of the two.
            unreachable!("leader path without sender");
        };
        // The guard releases the slot even if this future is dropped
        // mid-fetch; dropping the map's sender closes the channel, so
        // followers of an abandoned fetch error out instead of hanging.
        let guard = FlightGuard { inflight: &self.inflight, key: key.as_str().to_string() };
        let result = fetcher().await;

        if let Ok(value) = &result {
            self.put(key, value.clone());
        }
        // Release the slot before broadcasting: anyone subscribed now did so
        // before this send, and later arrivals start their own fetch instead
        // of waiting on a channel that already fired. Send errors just mean
        // nobody was waiting.
        drop(guard);
        let _ = tx.send(result.clone());

        result.map(GetOrFetch::Fresh)
    }

    /// Explicit invalidation of one key, on both tiers.
    pub async fn delete(&self, key: &CacheKey) -> Result<(), CacheError> {
        self.edge.delete(key.as_str()).await?;
        self.kv.delete(key.as_str()).await
    }

    /// Explicit invalidation of a whole prefix, on both tiers.
    pub async fn delete_by_prefix(&self, prefix: &str) -> Result<u32, CacheError> {
        self.edge.delete_by_prefix(prefix).await?;
        self.kv.delete_by_prefix(prefix).await
    }
}
