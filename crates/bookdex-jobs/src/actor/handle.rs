//! Cloneable handle through which everything outside the actor talks to it.

use super::{Command, PhotoStatus, ReadyState};
use crate::error::JobError;
use crate::socket::ProgressSocket;
use bookdex_core::job::{JobState, MessageType};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Result of a terminal RPC (`complete`, `send_error`, `cancel`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TerminalOutcome {
    /// The job was already in the requested terminal status; nothing
    /// changed (idempotent success).
    pub already: bool,
}

/// A freshly minted or refreshed capability token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenGrant {
    pub token: String,
    pub expires_in_seconds: u64,
}

/// Outcome of `wait_for_ready`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadyWait {
    pub ready: bool,
    pub timed_out: bool,
    pub disconnected: bool,
}

/// RPC handle for one job's progress actor.
#[derive(Clone)]
pub struct ProgressHandle {
    job_id: Uuid,
    tx: mpsc::Sender<Command>,
}

impl ProgressHandle {
    pub(crate) const fn new(job_id: Uuid, tx: mpsc::Sender<Command>) -> Self {
        Self { job_id, tx }
    }

    #[must_use]
    pub const fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// True when the actor task has exited.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn call<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, JobError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| JobError::ActorUnavailable)?;
        rx.await.map_err(|_| JobError::ActorUnavailable)
    }

    // ------------------------------------------------------------------
    // Transport surface
    // ------------------------------------------------------------------

    /// Validate a presented capability token before upgrading.
    pub async fn validate_token(&self, presented: &str) -> Result<(), JobError> {
        self.call(|reply| Command::ValidateToken { presented: presented.to_string(), reply })
            .await?
    }

    /// Hand the (accepted) socket to the actor. An earlier socket, if any,
    /// is closed 1000/"Superseded".
    pub async fn attach_socket(&self, socket: Box<dyn ProgressSocket>) -> Result<(), JobError> {
        self.call(|reply| Command::Attach { socket, reply }).await
    }

    /// The client sent its `ready` frame.
    pub async fn client_ready(&self) -> Result<(), JobError> {
        self.tx
            .send(Command::ClientReady)
            .await
            .map_err(|_| JobError::ActorUnavailable)
    }

    /// The transport observed the socket closing.
    pub async fn client_closed(&self) -> Result<(), JobError> {
        self.tx
            .send(Command::ClientClosed)
            .await
            .map_err(|_| JobError::ActorUnavailable)
    }

    // ------------------------------------------------------------------
    // Pipeline RPC surface
    // ------------------------------------------------------------------

    pub async fn set_auth_token(&self, token: String, ttl_seconds: u64) -> Result<(), JobError> {
        self.call(|reply| Command::SetAuthToken { token, ttl_seconds, reply }).await?
    }

    /// Wait for the client's ready handshake. Timeouts and disconnects are
    /// reported, not raised. Pipelines continue either way and results
    /// stay retrievable from persisted state.
    pub async fn wait_for_ready(&self, timeout: Duration) -> ReadyWait {
        let Ok(mut rx) = self.call(|reply| Command::SubscribeReady { reply }).await else {
            return ReadyWait { disconnected: true, ..ReadyWait::default() };
        };

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match *rx.borrow_and_update() {
                ReadyState::Ready => return ReadyWait { ready: true, ..ReadyWait::default() },
                ReadyState::Disconnected => {
                    return ReadyWait { disconnected: true, ..ReadyWait::default() };
                }
                ReadyState::Waiting => {}
            }
            match tokio::time::timeout_at(deadline, rx.changed()).await {
                Ok(Ok(())) => {}
                Ok(Err(_)) => return ReadyWait { disconnected: true, ..ReadyWait::default() },
                Err(_) => return ReadyWait { timed_out: true, ..ReadyWait::default() },
            }
        }
    }

    /// Enqueue an arbitrary enveloped message (dropped when no socket).
    pub async fn send_message(
        &self,
        message_type: MessageType,
        payload: serde_json::Value,
    ) -> Result<(), JobError> {
        self.call(|reply| Command::Send { message_type, payload, reply }).await
    }

    /// Record progress and stream a `progress` message.
    pub async fn update_progress(
        &self,
        progress: f64,
        processed_count: u32,
        payload: serde_json::Value,
    ) -> Result<u64, JobError> {
        self.update_progress_checked(progress, processed_count, payload, None).await
    }

    /// Progress update with optimistic concurrency: fails with
    /// `VersionConflict` when `expected_version` no longer matches.
    pub async fn update_progress_checked(
        &self,
        progress: f64,
        processed_count: u32,
        payload: serde_json::Value,
        expected_version: Option<u64>,
    ) -> Result<u64, JobError> {
        self.call(|reply| Command::UpdateProgress {
            progress,
            processed_count,
            payload,
            expected_version,
            reply,
        })
        .await?
    }

    pub async fn complete(&self, payload: serde_json::Value) -> Result<TerminalOutcome, JobError> {
        self.call(|reply| Command::Complete { payload, reply }).await?
    }

    pub async fn send_error(
        &self,
        payload: serde_json::Value,
    ) -> Result<TerminalOutcome, JobError> {
        self.call(|reply| Command::SendError { payload, reply }).await?
    }

    pub async fn cancel(&self, reason: Option<String>) -> Result<TerminalOutcome, JobError> {
        self.call(|reply| Command::Cancel { reason, reply }).await?
    }

    pub async fn init_batch(&self, total_photos: u32) -> Result<(), JobError> {
        self.call(|reply| Command::InitBatch { total_photos, reply }).await?
    }

    pub async fn update_photo(
        &self,
        index: usize,
        status: PhotoStatus,
        books_found: u32,
        expected_version: Option<u64>,
    ) -> Result<u64, JobError> {
        self.call(|reply| Command::UpdatePhoto {
            index,
            status,
            books_found,
            expected_version,
            reply,
        })
        .await?
    }

    pub async fn refresh_token(&self, presented: &str) -> Result<TokenGrant, JobError> {
        self.call(|reply| Command::RefreshToken { presented: presented.to_string(), reply })
            .await?
    }

    pub async fn get_job_state(&self) -> Result<JobState, JobError> {
        self.call(|reply| Command::GetJobState { reply }).await
    }

    /// Whether the job has been cancelled; pipelines poll this at async
    /// boundaries.
    pub async fn is_cancelled(&self) -> bool {
        self.get_job_state().await.map(|s| s.cancelled).unwrap_or(true)
    }

    pub async fn close_connection(&self, reason: &str) -> Result<(), JobError> {
        self.call(|reply| Command::CloseConnection { reason: reason.to_string(), reply })
            .await
    }
}
