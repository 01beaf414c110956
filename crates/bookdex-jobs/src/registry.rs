//! Locate-or-spawn registry of progress actors.
//!
//! One live actor per job id per process. Eviction (dropping the handle
//! map entry) stops the actor after a final checkpoint; the next lookup
//! spawns a fresh instance that reloads persisted state before serving.

use crate::actor::{ProgressHandle, now_ms, spawn_actor};
use crate::error::JobError;
use bookdex_core::config::CoreConfig;
use bookdex_core::job::{JobPipeline, JobState};
use bookdex_core::ports::JobStorePort;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub struct JobRegistry {
    store: Arc<dyn JobStorePort>,
    config: CoreConfig,
    actors: Mutex<HashMap<Uuid, ProgressHandle>>,
}

impl JobRegistry {
    #[must_use]
    pub fn new(store: Arc<dyn JobStorePort>, config: CoreConfig) -> Self {
        Self { store, config, actors: Mutex::new(HashMap::new()) }
    }

    /// Create a fresh job: state is persisted before the actor spawns, so
    /// an immediate eviction still finds it.
    pub async fn create(
        &self,
        job_id: Uuid,
        pipeline: JobPipeline,
        total_count: u32,
    ) -> Result<ProgressHandle, JobError> {
        let state = JobState::new(pipeline, total_count, now_ms());
        self.store
            .save_state(job_id, &state)
            .await
            .map_err(|e| JobError::Storage(e.to_string()))?;

        let handle = spawn_actor(job_id, Some(state), Arc::clone(&self.store), self.config.clone());
        self.actors.lock().unwrap().insert(job_id, handle.clone());
        Ok(handle)
    }

    /// Locate the live actor for a job, spawning one (which loads persisted
    /// state) when none is running.
    #[must_use]
    pub fn lookup(&self, job_id: Uuid) -> ProgressHandle {
        let mut actors = self.actors.lock().unwrap();
        if let Some(handle) = actors.get(&job_id) {
            if !handle.is_closed() {
                return handle.clone();
            }
        }
        let handle = spawn_actor(job_id, None, Arc::clone(&self.store), self.config.clone());
        actors.insert(job_id, handle.clone());
        handle
    }

    /// Drop the handle-map entry. The actor flushes a final checkpoint and
    /// exits once every outstanding handle is gone.
    pub fn evict(&self, job_id: Uuid) {
        self.actors.lock().unwrap().remove(&job_id);
    }
}
