//! Persistent job-state storage port.
//!
//! Each job persists three values under its actor's key-space: the
//! `JobState` JSON, the capability token, and the token's expiry. The actor
//! checkpoints through this port and reloads from it after eviction.

use crate::job::JobState;
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// Persisted capability token for one job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthToken {
    pub token: String,
    /// Epoch milliseconds.
    pub expires_at_ms: i64,
}

impl AuthToken {
    #[must_use]
    pub const fn is_expired(&self, now_ms: i64) -> bool {
        now_ms > self.expires_at_ms
    }

    /// Milliseconds of life remaining (zero when expired).
    #[must_use]
    pub const fn remaining_ms(&self, now_ms: i64) -> i64 {
        let remaining = self.expires_at_ms - now_ms;
        if remaining < 0 { 0 } else { remaining }
    }
}

/// Storage failures, distinguished so corruption can be surfaced rather than
/// retried.
#[derive(Debug, Error)]
pub enum JobStoreError {
    #[error("job storage failure: {0}")]
    Storage(String),
    /// The persisted bytes exist but do not parse as a `JobState`.
    #[error("persisted job state is corrupt: {0}")]
    Corrupt(String),
}

/// Port for the per-job persistent key-space.
#[async_trait]
pub trait JobStorePort: Send + Sync {
    /// Load the persisted state. `Ok(None)` means nothing was ever written;
    /// `Err(Corrupt)` means bytes exist but are unreadable.
    async fn load_state(&self, job_id: Uuid) -> Result<Option<JobState>, JobStoreError>;

    async fn save_state(&self, job_id: Uuid, state: &JobState) -> Result<(), JobStoreError>;

    async fn load_token(&self, job_id: Uuid) -> Result<Option<AuthToken>, JobStoreError>;

    async fn save_token(&self, job_id: Uuid, token: &AuthToken) -> Result<(), JobStoreError>;

    /// Remove everything persisted for the job (cleanup alarm path).
    async fn delete(&self, job_id: Uuid) -> Result<(), JobStoreError>;
}
