//! The per-job progress actor.
//!
//! One task per job id owns the `JobState`, the (at most one) WebSocket
//! sink, the ready handshake, checkpointing, and the cleanup alarm. Every
//! mutation and every outbound message flows through the actor's mailbox,
//! which is what makes ordering and atomicity structural rather than
//! something callers must get right.

mod handle;

pub use handle::{ProgressHandle, ReadyWait, TerminalOutcome, TokenGrant};

use crate::error::JobError;
use crate::socket::{CLOSE_NORMAL, ProgressSocket};
use crate::token;
use bookdex_core::config::CoreConfig;
use bookdex_core::job::{JobState, JobStatus, MessageType, ProgressMessage, TransitionOutcome};
use bookdex_core::ports::{AuthToken, JobStoreError, JobStorePort};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, warn};
use uuid::Uuid;

/// Mailbox depth. RPCs are small and the actor never blocks for long;
/// back-pressure past this depth is intended.
const MAILBOX: usize = 128;

/// Per-photo status inside a bookshelf-scan job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotoStatus {
    Pending,
    Completed,
    Failed,
}

impl PhotoStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Client-visible readiness of the job's WebSocket.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ReadyState {
    /// No `ready` frame yet (socket may or may not be attached).
    Waiting,
    /// Client sent `ready`; pipelines may stream.
    Ready,
    /// Socket dropped before the handshake completed.
    Disconnected,
}

type Reply<T> = oneshot::Sender<T>;

pub(crate) enum Command {
    ValidateToken { presented: String, reply: Reply<Result<(), JobError>> },
    Attach { socket: Box<dyn ProgressSocket>, reply: Reply<()> },
    ClientReady,
    ClientClosed,
    SetAuthToken { token: String, ttl_seconds: u64, reply: Reply<Result<(), JobError>> },
    SubscribeReady { reply: Reply<watch::Receiver<ReadyState>> },
    Send { message_type: MessageType, payload: serde_json::Value, reply: Reply<()> },
    UpdateProgress {
        progress: f64,
        processed_count: u32,
        payload: serde_json::Value,
        expected_version: Option<u64>,
        reply: Reply<Result<u64, JobError>>,
    },
    Complete { payload: serde_json::Value, reply: Reply<Result<TerminalOutcome, JobError>> },
    SendError { payload: serde_json::Value, reply: Reply<Result<TerminalOutcome, JobError>> },
    Cancel { reason: Option<String>, reply: Reply<Result<TerminalOutcome, JobError>> },
    InitBatch { total_photos: u32, reply: Reply<Result<(), JobError>> },
    UpdatePhoto {
        index: usize,
        status: PhotoStatus,
        books_found: u32,
        expected_version: Option<u64>,
        reply: Reply<Result<u64, JobError>>,
    },
    RefreshToken { presented: String, reply: Reply<Result<TokenGrant, JobError>> },
    GetJobState { reply: Reply<JobState> },
    CloseConnection { reason: String, reply: Reply<()> },
    CleanupAlarm,
}

/// Spawn the actor for a job.
///
/// With `initial: Some(state)` the state is taken as-is (creation path,
/// already persisted by the registry). With `None` the actor loads the
/// persisted state before serving its first command; absent or corrupt
/// state is presented as `failed` with "State corruption detected" and is
/// never written back.
pub(crate) fn spawn_actor(
    job_id: Uuid,
    initial: Option<JobState>,
    store: Arc<dyn JobStorePort>,
    config: CoreConfig,
) -> ProgressHandle {
    let (tx, rx) = mpsc::channel(MAILBOX);
    let handle = ProgressHandle::new(job_id, tx.clone());

    tokio::spawn(async move {
        let (state, presenting_corruption) = match initial {
            Some(state) => (state, false),
            None => match store.load_state(job_id).await {
                Ok(Some(state)) => (state, false),
                Ok(None) => {
                    warn!(%job_id, "no persisted state for job, presenting corruption");
                    (JobState::corrupted(now_ms()), true)
                }
                Err(JobStoreError::Corrupt(e)) => {
                    warn!(%job_id, error = %e, "persisted job state corrupt");
                    (JobState::corrupted(now_ms()), true)
                }
                Err(JobStoreError::Storage(e)) => {
                    warn!(%job_id, error = %e, "job store unavailable, presenting corruption");
                    (JobState::corrupted(now_ms()), true)
                }
            },
        };
        let auth_token = store.load_token(job_id).await.ok().flatten();

        let (ready_tx, _) = watch::channel(ReadyState::Waiting);
        let mut actor = ProgressActor {
            job_id,
            state,
            presenting_corruption,
            auth_token,
            store,
            config,
            socket: None,
            ready_tx,
            last_checkpoint: Instant::now(),
            cleanup_scheduled: false,
            // Weak: the actor's own alarm plumbing must not keep an evicted
            // actor alive. The pending-alarm task holds a strong sender, so
            // a terminal actor survives until its alarm fires.
            self_tx: tx.downgrade(),
        };
        drop(tx);
        actor.run(rx).await;
    });

    handle
}

struct ProgressActor {
    job_id: Uuid,
    state: JobState,
    /// True when this instance is presenting a corruption failure; such
    /// state is never persisted (surfaced, not healed).
    presenting_corruption: bool,
    auth_token: Option<AuthToken>,
    store: Arc<dyn JobStorePort>,
    config: CoreConfig,
    socket: Option<Box<dyn ProgressSocket>>,
    ready_tx: watch::Sender<ReadyState>,
    last_checkpoint: Instant,
    cleanup_scheduled: bool,
    self_tx: mpsc::WeakSender<Command>,
}

impl ProgressActor {
    async fn run(&mut self, mut rx: mpsc::Receiver<Command>) {
        let mut cleaned_up = false;
        while let Some(command) = rx.recv().await {
            if self.handle(command).await {
                cleaned_up = true;
                break;
            }
        }
        // Eviction or shutdown: flush whatever the cadence left unwritten.
        // After a cleanup delete there is nothing left worth resurrecting.
        if !cleaned_up {
            self.checkpoint(true).await;
        }
        debug!(job_id = %self.job_id, "progress actor stopped");
    }

    /// Handle one command; `true` means the actor should stop.
    async fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::ValidateToken { presented, reply } => {
                let _ = reply.send(token::validate(self.auth_token.as_ref(), &presented, now_ms()));
            }
            Command::Attach { socket, reply } => {
                if let Some(mut superseded) = self.socket.replace(socket) {
                    superseded.close(CLOSE_NORMAL, "Superseded").await;
                }
                // Fresh handshake unless the client already completed one.
                if *self.ready_tx.borrow() != ReadyState::Ready {
                    let _ = self.ready_tx.send(ReadyState::Waiting);
                }
                let _ = reply.send(());
            }
            Command::ClientReady => {
                let _ = self.ready_tx.send(ReadyState::Ready);
                self.send_envelope(MessageType::ReadyAck, serde_json::Value::Null).await;
            }
            Command::ClientClosed => {
                self.socket = None;
                if *self.ready_tx.borrow() != ReadyState::Ready {
                    let _ = self.ready_tx.send(ReadyState::Disconnected);
                }
            }
            Command::SetAuthToken { token, ttl_seconds, reply } => {
                let auth = AuthToken {
                    token,
                    expires_at_ms: now_ms() + to_ms(ttl_seconds),
                };
                let result = match self.store.save_token(self.job_id, &auth).await {
                    Ok(()) => {
                        self.auth_token = Some(auth);
                        Ok(())
                    }
                    Err(e) => Err(JobError::Storage(e.to_string())),
                };
                let _ = reply.send(result);
            }
            Command::SubscribeReady { reply } => {
                let _ = reply.send(self.ready_tx.subscribe());
            }
            Command::Send { message_type, payload, reply } => {
                self.send_envelope(message_type, payload).await;
                let _ = reply.send(());
            }
            Command::UpdateProgress { progress, processed_count, payload, expected_version, reply } => {
                let _ = reply.send(
                    self.update_progress(progress, processed_count, payload, expected_version)
                        .await,
                );
            }
            Command::Complete { payload, reply } => {
                let _ = reply.send(self.terminal(JobStatus::Completed, payload, None).await);
            }
            Command::SendError { payload, reply } => {
                let error_text = payload
                    .get("message")
                    .and_then(serde_json::Value::as_str)
                    .map(str::to_string);
                let _ = reply.send(self.terminal(JobStatus::Failed, payload, error_text).await);
            }
            Command::Cancel { reason, reply } => {
                let _ = reply
                    .send(self.terminal(JobStatus::Cancelled, serde_json::Value::Null, reason).await);
            }
            Command::InitBatch { total_photos, reply } => {
                let photos: Vec<_> = (0..total_photos)
                    .map(|_| json!({"status": PhotoStatus::Pending.as_str(), "booksFound": 0}))
                    .collect();
                self.state.total_count = total_photos;
                self.state.pipeline_state = json!({ "photos": photos });
                self.state.record_mutation(now_ms());
                self.checkpoint(false).await;
                let _ = reply.send(Ok(()));
            }
            Command::UpdatePhoto { index, status, books_found, expected_version, reply } => {
                let _ = reply.send(
                    self.update_photo(index, status, books_found, expected_version).await,
                );
            }
            Command::RefreshToken { presented, reply } => {
                let _ = reply.send(self.refresh_token(&presented).await);
            }
            Command::GetJobState { reply } => {
                let _ = reply.send(self.state.clone());
            }
            Command::CloseConnection { reason, reply } => {
                if let Some(mut socket) = self.socket.take() {
                    socket.close(CLOSE_NORMAL, &reason).await;
                }
                if *self.ready_tx.borrow() != ReadyState::Ready {
                    let _ = self.ready_tx.send(ReadyState::Disconnected);
                }
                let _ = reply.send(());
            }
            Command::CleanupAlarm => {
                if self.state.status.is_terminal() && self.socket.is_none() {
                    if let Err(e) = self.store.delete(self.job_id).await {
                        warn!(job_id = %self.job_id, error = %e, "cleanup delete failed");
                    }
                    return true;
                }
            }
        }
        false
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    async fn update_progress(
        &mut self,
        progress: f64,
        processed_count: u32,
        payload: serde_json::Value,
        expected_version: Option<u64>,
    ) -> Result<u64, JobError> {
        self.check_version(expected_version)?;
        if self.state.status.is_terminal() {
            return Err(bookdex_core::job::InvalidTransition {
                from: self.state.status,
                to: JobStatus::Running,
            }
            .into());
        }
        // First progress report moves a pending job to running.
        if self.state.status == JobStatus::Pending {
            self.state.transition(JobStatus::Running, now_ms())?;
        }

        self.state.record_progress(progress, processed_count, now_ms());
        self.checkpoint(false).await;
        self.send_envelope(MessageType::Progress, payload).await;
        Ok(self.state.version)
    }

    /// Shared implementation of the three terminal RPCs. Re-applying the
    /// current terminal status is an idempotent success that re-sends the
    /// terminal message but never mutates persisted state.
    async fn terminal(
        &mut self,
        target: JobStatus,
        payload: serde_json::Value,
        error_text: Option<String>,
    ) -> Result<TerminalOutcome, JobError> {
        let outcome = self.state.transition(target, now_ms())?;
        let already = outcome == TransitionOutcome::AlreadyTerminal;

        if !already {
            if let Some(error_text) = error_text {
                self.state.error = Some(error_text);
            } else if target == JobStatus::Cancelled {
                self.state.error.get_or_insert_with(|| "Cancelled".to_string());
            }
            // Terminal transitions checkpoint immediately.
            self.checkpoint(true).await;
            self.schedule_cleanup();
        }

        match target {
            JobStatus::Completed => self.send_envelope(MessageType::Complete, payload).await,
            JobStatus::Failed => self.send_envelope(MessageType::Error, payload).await,
            JobStatus::Cancelled => {}
            JobStatus::Pending | JobStatus::Running => unreachable!("terminal() with non-terminal"),
        }

        Ok(TerminalOutcome { already })
    }

    async fn update_photo(
        &mut self,
        index: usize,
        status: PhotoStatus,
        books_found: u32,
        expected_version: Option<u64>,
    ) -> Result<u64, JobError> {
        self.check_version(expected_version)?;

        let photos = self
            .state
            .pipeline_state
            .get_mut("photos")
            .and_then(serde_json::Value::as_array_mut)
            .ok_or(JobError::PhotoIndexOutOfRange(index))?;
        let slot = photos.get_mut(index).ok_or(JobError::PhotoIndexOutOfRange(index))?;
        *slot = json!({"status": status.as_str(), "booksFound": books_found});

        self.state.record_mutation(now_ms());
        self.checkpoint(false).await;
        Ok(self.state.version)
    }

    async fn refresh_token(&mut self, presented: &str) -> Result<TokenGrant, JobError> {
        let window_ms = to_ms(self.config.token_refresh_window_seconds);
        token::refresh_allowed(self.auth_token.as_ref(), presented, now_ms(), window_ms)?;

        let fresh = AuthToken {
            token: token::mint_token(),
            expires_at_ms: now_ms() + to_ms(self.config.token_lifetime_seconds),
        };
        self.store
            .save_token(self.job_id, &fresh)
            .await
            .map_err(|e| JobError::Storage(e.to_string()))?;

        let grant = TokenGrant {
            token: fresh.token.clone(),
            expires_in_seconds: self.config.token_lifetime_seconds,
        };
        self.auth_token = Some(fresh);
        Ok(grant)
    }

    fn check_version(&self, expected: Option<u64>) -> Result<(), JobError> {
        match expected {
            Some(expected) if expected != self.state.version => Err(JobError::VersionConflict {
                expected,
                actual: self.state.version,
            }),
            _ => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    /// Send one enveloped message to the attached socket, in mailbox order.
    /// With no socket the message is dropped; clients reconcile through
    /// `getJobState` after reconnecting.
    async fn send_envelope(&mut self, message_type: MessageType, payload: serde_json::Value) {
        let Some(socket) = self.socket.as_mut() else {
            return;
        };
        let message = ProgressMessage::new(self.state.pipeline, self.job_id, message_type, payload);
        match serde_json::to_string(&message) {
            Ok(text) => {
                if socket.send_text(text).await.is_err() {
                    self.socket = None;
                    if *self.ready_tx.borrow() != ReadyState::Ready {
                        let _ = self.ready_tx.send(ReadyState::Disconnected);
                    }
                }
            }
            Err(e) => warn!(job_id = %self.job_id, error = %e, "unserializable envelope"),
        }
    }

    /// Checkpoint on the N-updates / T-seconds / terminal cadence.
    async fn checkpoint(&mut self, force: bool) {
        if self.presenting_corruption || self.state.updates_since_checkpoint == 0 {
            return;
        }
        let due = force
            || self.state.updates_since_checkpoint >= self.config.checkpoint_every_n_updates
            || self.last_checkpoint.elapsed()
                >= Duration::from_secs(self.config.checkpoint_every_seconds);
        if !due {
            return;
        }

        match self.store.save_state(self.job_id, &self.state).await {
            Ok(()) => {
                self.state.mark_checkpointed();
                self.last_checkpoint = Instant::now();
            }
            // A failed checkpoint is retried on the next mutation.
            Err(e) => warn!(job_id = %self.job_id, error = %e, "checkpoint failed"),
        }
    }

    /// Arm the cleanup alarm once; repeated terminal transitions collapse
    /// into the single scheduled alarm.
    fn schedule_cleanup(&mut self) {
        if self.cleanup_scheduled {
            return;
        }
        let Some(tx) = self.self_tx.upgrade() else {
            return;
        };
        self.cleanup_scheduled = true;

        let delay = Duration::from_secs(self.config.cleanup_after_terminal_hours * 3600);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(Command::CleanupAlarm).await;
        });
    }
}

pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

const fn to_ms(seconds: u64) -> i64 {
    (seconds as i64).saturating_mul(1000)
}
