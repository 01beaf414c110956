//! Persistence port for rate-limit window state.

use crate::window::WindowState;
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// Substrate failure while loading or saving window state. The middleware
/// fails open on these: availability trumps strict enforcement.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("rate-limit store failure: {0}")]
pub struct RateStoreError(pub String);

/// Port for durable window state, keyed by client key (typically an IP).
#[async_trait]
pub trait RateWindowStore: Send + Sync {
    async fn load(&self, key: &str) -> Result<Option<WindowState>, RateStoreError>;

    async fn save(&self, key: &str, state: &WindowState) -> Result<(), RateStoreError>;
}

/// In-memory store for tests and single-node deployments.
#[derive(Debug, Default)]
pub struct MemoryRateStore {
    windows: RwLock<HashMap<String, WindowState>>,
}

impl MemoryRateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateWindowStore for MemoryRateStore {
    async fn load(&self, key: &str) -> Result<Option<WindowState>, RateStoreError> {
        Ok(self.windows.read().await.get(key).copied())
    }

    async fn save(&self, key: &str, state: &WindowState) -> Result<(), RateStoreError> {
        self.windows.write().await.insert(key.to_string(), *state);
        Ok(())
    }
}

/// Store that always fails, for exercising the fail-open path.
#[cfg(test)]
pub struct BrokenRateStore;

#[cfg(test)]
#[async_trait]
impl RateWindowStore for BrokenRateStore {
    async fn load(&self, _key: &str) -> Result<Option<WindowState>, RateStoreError> {
        Err(RateStoreError("substrate unavailable".to_string()))
    }

    async fn save(&self, _key: &str, _state: &WindowState) -> Result<(), RateStoreError> {
        Err(RateStoreError("substrate unavailable".to_string()))
    }
}
