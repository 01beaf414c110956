//! In-memory implementation of the job store port.
//!
//! State is persisted as serialized JSON (not live structs) so that the
//! corruption path (bytes exist but do not parse) is honest and testable.

use async_trait::async_trait;
use bookdex_core::job::JobState;
use bookdex_core::ports::{AuthToken, JobStoreError, JobStorePort};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default, Clone)]
struct JobRecord {
    state_json: Option<String>,
    token: Option<AuthToken>,
}

/// In-memory job store for tests and single-node deployments.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    records: RwLock<HashMap<Uuid, JobRecord>>,
}

impl MemoryJobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a job's persisted state with unparseable bytes.
    /// Exists to exercise the corruption-surfacing path in tests.
    pub async fn corrupt_state(&self, job_id: Uuid) {
        let mut records = self.records.write().await;
        records.entry(job_id).or_default().state_json = Some("{not json".to_string());
    }

    /// Whether anything is persisted for the job.
    pub async fn contains(&self, job_id: Uuid) -> bool {
        self.records.read().await.contains_key(&job_id)
    }
}

#[async_trait]
impl JobStorePort for MemoryJobStore {
    async fn load_state(&self, job_id: Uuid) -> Result<Option<JobState>, JobStoreError> {
        let records = self.records.read().await;
        match records.get(&job_id).and_then(|r| r.state_json.as_deref()) {
            Some(json) => serde_json::from_str(json)
                .map(Some)
                .map_err(|e| JobStoreError::Corrupt(e.to_string())),
            None => Ok(None),
        }
    }

    async fn save_state(&self, job_id: Uuid, state: &JobState) -> Result<(), JobStoreError> {
        let json =
            serde_json::to_string(state).map_err(|e| JobStoreError::Storage(e.to_string()))?;
        let mut records = self.records.write().await;
        records.entry(job_id).or_default().state_json = Some(json);
        Ok(())
    }

    async fn load_token(&self, job_id: Uuid) -> Result<Option<AuthToken>, JobStoreError> {
        Ok(self.records.read().await.get(&job_id).and_then(|r| r.token.clone()))
    }

    async fn save_token(&self, job_id: Uuid, token: &AuthToken) -> Result<(), JobStoreError> {
        let mut records = self.records.write().await;
        records.entry(job_id).or_default().token = Some(token.clone());
        Ok(())
    }

    async fn delete(&self, job_id: Uuid) -> Result<(), JobStoreError> {
        self.records.write().await.remove(&job_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookdex_core::job::JobPipeline;

    #[tokio::test]
    async fn test_round_trip() {
        let store = MemoryJobStore::new();
        let job_id = Uuid::new_v4();
        let state = JobState::new(JobPipeline::CsvImport, 5, 1_000);

        store.save_state(job_id, &state).await.unwrap();
        let loaded = store.load_state(job_id).await.unwrap().unwrap();
        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn test_absent_state_is_none() {
        let store = MemoryJobStore::new();
        assert!(store.load_state(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_state_is_an_error_not_a_guess() {
        let store = MemoryJobStore::new();
        let job_id = Uuid::new_v4();
        store.corrupt_state(job_id).await;

        assert!(matches!(
            store.load_state(job_id).await,
            Err(JobStoreError::Corrupt(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_everything() {
        let store = MemoryJobStore::new();
        let job_id = Uuid::new_v4();
        store.save_state(job_id, &JobState::new(JobPipeline::BookshelfScan, 1, 0)).await.unwrap();
        store
            .save_token(job_id, &AuthToken { token: "t".to_string(), expires_at_ms: 10 })
            .await
            .unwrap();

        store.delete(job_id).await.unwrap();
        assert!(!store.contains(job_id).await);
    }
}
