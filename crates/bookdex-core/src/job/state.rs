//! Job lifecycle state: status machine, progress bookkeeping, checkpoint
//! counters.
//!
//! `JobState` is a pure data type. All mutation goes through the owning
//! progress actor, which calls the methods here and persists the result;
//! nothing in this module performs I/O.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which pipeline a job runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPipeline {
    SingleEnrichment,
    BatchEnrichment,
    CsvImport,
    BookshelfScan,
}

impl JobPipeline {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SingleEnrichment => "single_enrichment",
            Self::BatchEnrichment => "batch_enrichment",
            Self::CsvImport => "csv_import",
            Self::BookshelfScan => "bookshelf_scan",
        }
    }
}

impl fmt::Display for JobPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Job status. Terminal statuses are absorbing: once entered, the only
/// accepted "transition" is the idempotent re-application of the same status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Legal edges of the status machine.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running | Self::Cancelled)
                | (Self::Running, Self::Completed | Self::Failed | Self::Cancelled)
        )
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rejected status change.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid transition: {from} -> {to}")]
pub struct InvalidTransition {
    pub from: JobStatus,
    pub to: JobStatus,
}

/// Result of applying a transition to the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The status changed.
    Applied,
    /// The job was already in the requested terminal status; the request is
    /// treated as an idempotent no-op so client-driven retries stay cheap.
    AlreadyTerminal,
}

impl TransitionOutcome {
    #[must_use]
    pub const fn already(&self) -> bool {
        matches!(self, Self::AlreadyTerminal)
    }
}

/// Complete persisted state of one job, owned by its progress actor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobState {
    pub pipeline: JobPipeline,
    pub status: JobStatus,
    /// Overall fraction complete, 0.0-1.0, non-decreasing while running.
    pub progress: f64,
    pub processed_count: u32,
    pub total_count: u32,
    /// Monotonic counter, incremented on every accepted mutation.
    pub version: u64,
    /// Epoch milliseconds.
    pub created_at: i64,
    pub last_update_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Pipeline-specific substructure (e.g. per-photo status array).
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub pipeline_state: serde_json::Value,
    #[serde(default)]
    pub cancelled: bool,
    #[serde(default)]
    pub updates_since_checkpoint: u32,
}

impl JobState {
    /// Fresh pending job.
    #[must_use]
    pub fn new(pipeline: JobPipeline, total_count: u32, now_ms: i64) -> Self {
        Self {
            pipeline,
            status: JobStatus::Pending,
            progress: 0.0,
            processed_count: 0,
            total_count,
            version: 0,
            created_at: now_ms,
            last_update_at: now_ms,
            completed_at: None,
            error: None,
            pipeline_state: serde_json::Value::Null,
            cancelled: false,
            updates_since_checkpoint: 0,
        }
    }

    /// The state a re-instantiated actor presents when its persisted state is
    /// absent or unreadable. Corruption is surfaced, never healed.
    #[must_use]
    pub fn corrupted(now_ms: i64) -> Self {
        let mut state = Self::new(JobPipeline::SingleEnrichment, 0, now_ms);
        state.status = JobStatus::Failed;
        state.error = Some("State corruption detected".to_string());
        state.completed_at = Some(now_ms);
        state
    }

    /// Apply a status transition.
    ///
    /// Re-applying the current terminal status is an idempotent success;
    /// every other illegal edge is an [`InvalidTransition`].
    pub fn transition(
        &mut self,
        next: JobStatus,
        now_ms: i64,
    ) -> Result<TransitionOutcome, InvalidTransition> {
        if self.status == next && next.is_terminal() {
            return Ok(TransitionOutcome::AlreadyTerminal);
        }
        if !self.status.can_transition_to(next) {
            return Err(InvalidTransition { from: self.status, to: next });
        }

        self.status = next;
        if next.is_terminal() {
            self.completed_at = Some(now_ms);
            if next == JobStatus::Cancelled {
                self.cancelled = true;
            }
        }
        self.record_mutation(now_ms);
        Ok(TransitionOutcome::Applied)
    }

    /// Record a progress update. Progress is clamped to `[0, 1]` and never
    /// moves backwards; `processed_count` is capped at `total_count`.
    pub fn record_progress(&mut self, progress: f64, processed_count: u32, now_ms: i64) {
        self.progress = self.progress.max(progress.clamp(0.0, 1.0));
        self.processed_count = processed_count.min(self.total_count);
        self.record_mutation(now_ms);
    }

    /// Bump version and bookkeeping after any accepted mutation.
    pub fn record_mutation(&mut self, now_ms: i64) {
        self.version += 1;
        self.last_update_at = now_ms;
        self.updates_since_checkpoint += 1;
    }

    /// Reset the checkpoint counter after a successful persist.
    pub fn mark_checkpointed(&mut self) {
        self.updates_since_checkpoint = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_state() -> JobState {
        let mut state = JobState::new(JobPipeline::BatchEnrichment, 20, 1_000);
        state.transition(JobStatus::Running, 1_001).unwrap();
        state
    }

    #[test]
    fn test_legal_transitions() {
        let mut state = JobState::new(JobPipeline::CsvImport, 0, 0);
        assert_eq!(state.transition(JobStatus::Running, 1).unwrap(), TransitionOutcome::Applied);
        assert_eq!(
            state.transition(JobStatus::Completed, 2).unwrap(),
            TransitionOutcome::Applied
        );
        assert_eq!(state.completed_at, Some(2));
    }

    #[test]
    fn test_pending_can_cancel_but_not_complete() {
        let mut state = JobState::new(JobPipeline::CsvImport, 0, 0);
        assert!(state.transition(JobStatus::Completed, 1).is_err());
        assert_eq!(
            state.transition(JobStatus::Cancelled, 1).unwrap(),
            TransitionOutcome::Applied
        );
        assert!(state.cancelled);
    }

    #[test]
    fn test_terminal_is_idempotent_for_same_status() {
        let mut state = running_state();
        state.transition(JobStatus::Completed, 2).unwrap();
        let version_before = state.version;

        let outcome = state.transition(JobStatus::Completed, 3).unwrap();
        assert!(outcome.already());
        // Idempotent re-application does not count as a mutation.
        assert_eq!(state.version, version_before);
    }

    #[test]
    fn test_terminal_rejects_different_terminal() {
        let mut state = running_state();
        state.transition(JobStatus::Failed, 2).unwrap();

        let err = state.transition(JobStatus::Completed, 3).unwrap_err();
        assert_eq!(err.from, JobStatus::Failed);
        assert_eq!(err.to, JobStatus::Completed);
    }

    #[test]
    fn test_progress_is_monotone_and_clamped() {
        let mut state = running_state();
        state.record_progress(0.5, 10, 2);
        state.record_progress(0.3, 12, 3);
        assert!((state.progress - 0.5).abs() < f64::EPSILON);
        assert_eq!(state.processed_count, 12);

        state.record_progress(7.0, 99, 4);
        assert!((state.progress - 1.0).abs() < f64::EPSILON);
        // processed_count never exceeds total_count.
        assert_eq!(state.processed_count, 20);
    }

    #[test]
    fn test_version_strictly_increases_across_mutations() {
        let mut state = running_state();
        let mut last = state.version;
        for i in 0..5 {
            state.record_progress(f64::from(i) / 10.0, i, i64::from(i));
            assert!(state.version > last);
            last = state.version;
        }
    }

    #[test]
    fn test_corrupted_state_presents_failed() {
        let state = JobState::corrupted(42);
        assert_eq!(state.status, JobStatus::Failed);
        assert_eq!(state.error.as_deref(), Some("State corruption detected"));
    }

    #[test]
    fn test_serde_round_trip_camel_case() {
        let state = running_state();
        let json = serde_json::to_value(&state).unwrap();
        assert!(json.get("processedCount").is_some());
        assert!(json.get("lastUpdateAt").is_some());
        let back: JobState = serde_json::from_value(json).unwrap();
        assert_eq!(back, state);
    }
}
