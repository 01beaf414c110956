//! Cache tier port and the in-memory implementation.
//!
//! Two tiers exist in production: a short-lived edge tier close to the
//! client and a distributed KV tier. Both satisfy the same trait; the
//! service layer owns the lookup order and write policy.

use crate::entry::CacheEntry;
use crate::error::CacheError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Storage port implemented by each cache tier.
#[async_trait]
pub trait CacheTier: Send + Sync {
    /// Fetch an entry. Implementations must not return expired entries.
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;

    async fn put(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Delete every key with the given prefix; returns how many were removed.
    async fn delete_by_prefix(&self, prefix: &str) -> Result<u32, CacheError>;
}

/// In-memory tier used for the edge tier, for tests, and for single-node
/// deployments of the KV tier. Expired entries are dropped lazily on read.
#[derive(Debug, Default)]
pub struct MemoryTier {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl MemoryTier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (possibly expired-but-unswept) entries.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheTier for MemoryTier {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let expired = {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.is_expired(now_ms) => true,
                Some(entry) => return Ok(Some(entry.clone())),
                None => return Ok(None),
            }
        };
        if expired {
            self.entries.write().await.remove(key);
        }
        Ok(None)
    }

    async fn put(&self, key: &str, entry: CacheEntry) -> Result<(), CacheError> {
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<u32, CacheError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        Ok((before - entries.len()) as u32)
    }
}
