//! Sharded registry of per-key limiter actors.

use crate::actor::{KeyActorHandle, spawn_key_actor};
use crate::store::{RateStoreError, RateWindowStore};
use crate::window::RateDecision;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

/// Handle-map shards; only the map lookup is sharded, state itself lives in
/// the actors.
const SHARDS: usize = 16;

/// How long a key actor lingers without traffic before exiting.
const ACTOR_IDLE: Duration = Duration::from_secs(180);

/// Limiter failure. The middleware treats any of these as "admit".
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LimiterError {
    #[error(transparent)]
    Store(#[from] RateStoreError),
    #[error("rate-limit actor unavailable")]
    Unavailable,
}

/// The per-key fixed-window rate limiter.
pub struct RateLimiter {
    store: Arc<dyn RateWindowStore>,
    window_ms: i64,
    max_requests: u32,
    shards: Vec<Mutex<HashMap<String, KeyActorHandle>>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(store: Arc<dyn RateWindowStore>, window_seconds: u64, max_requests: u32) -> Self {
        let shards = (0..SHARDS).map(|_| Mutex::new(HashMap::new())).collect();
        Self {
            store,
            window_ms: i64::try_from(window_seconds.saturating_mul(1000)).unwrap_or(i64::MAX),
            max_requests,
            shards,
        }
    }

    /// Atomic check-and-increment for one key.
    ///
    /// Exactly `max_requests` calls per window return `allowed`, no matter
    /// how many arrive concurrently; the key's actor serializes them.
    pub async fn check_and_increment(&self, key: &str) -> Result<RateDecision, LimiterError> {
        let now_ms = chrono::Utc::now().timestamp_millis();

        // One respawn attempt covers the race where an idle actor exits
        // between lookup and send.
        for _ in 0..2 {
            let handle = self.handle_for(key);
            match handle.check(now_ms).await {
                Some(result) => return result.map_err(LimiterError::from),
                None => self.evict_closed(key),
            }
        }
        Err(LimiterError::Unavailable)
    }

    fn shard(&self, key: &str) -> &Mutex<HashMap<String, KeyActorHandle>> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        &self.shards[(hasher.finish() as usize) % SHARDS]
    }

    fn handle_for(&self, key: &str) -> KeyActorHandle {
        let mut shard = self.shard(key).lock().unwrap();
        if let Some(handle) = shard.get(key) {
            if !handle.is_closed() {
                return handle.clone();
            }
        }
        let handle = spawn_key_actor(
            key.to_string(),
            Arc::clone(&self.store),
            self.window_ms,
            self.max_requests,
            ACTOR_IDLE,
        );
        shard.insert(key.to_string(), handle.clone());
        handle
    }

    fn evict_closed(&self, key: &str) {
        let mut shard = self.shard(key).lock().unwrap();
        if let Some(current) = shard.get(key) {
            if current.is_closed() {
                shard.remove(key);
            }
        }
    }
}
