//! Per-key limiter actor.
//!
//! One task owns one key's window state; every check for that key is a
//! message through its mailbox, so check-and-increment is atomic by
//! construction, with no locks and no compare-and-swap.

use crate::store::{RateStoreError, RateWindowStore};
use crate::window::{RateDecision, WindowState, check_and_increment};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Mailbox depth per key actor. Checks are tiny; a burst beyond this just
/// waits on the channel.
const MAILBOX: usize = 64;

pub(crate) enum Command {
    Check { now_ms: i64, reply: oneshot::Sender<Result<RateDecision, RateStoreError>> },
}

#[derive(Clone)]
pub(crate) struct KeyActorHandle {
    tx: mpsc::Sender<Command>,
}

impl KeyActorHandle {
    pub(crate) async fn check(
        &self,
        now_ms: i64,
    ) -> Option<Result<RateDecision, RateStoreError>> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(Command::Check { now_ms, reply }).await.ok()?;
        rx.await.ok()
    }

    /// True when the actor task has exited and the handle is stale.
    pub(crate) fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Spawn the actor for one key. The task loads persisted state lazily on the
/// first check, serves checks until idle for `idle_timeout`, then exits;
/// the registry respawns on demand.
pub(crate) fn spawn_key_actor(
    key: String,
    store: Arc<dyn RateWindowStore>,
    window_ms: i64,
    max_requests: u32,
    idle_timeout: Duration,
) -> KeyActorHandle {
    let (tx, mut rx) = mpsc::channel(MAILBOX);

    tokio::spawn(async move {
        // None until first use; Some(loaded) afterwards. Load failures are
        // propagated per-check, never cached, so a recovering substrate
        // starts working again immediately.
        let mut state: Option<WindowState> = None;
        let mut loaded = false;

        loop {
            let command = match tokio::time::timeout(idle_timeout, rx.recv()).await {
                Ok(Some(command)) => command,
                // Idle or all handles dropped: let the registry reap us.
                Ok(None) | Err(_) => break,
            };

            match command {
                Command::Check { now_ms, reply } => {
                    if !loaded {
                        match store.load(&key).await {
                            Ok(persisted) => {
                                state = persisted;
                                loaded = true;
                            }
                            Err(e) => {
                                let _ = reply.send(Err(e));
                                continue;
                            }
                        }
                    }

                    let (next, decision, mutated) =
                        check_and_increment(state, now_ms, window_ms, max_requests);
                    state = Some(next);

                    let result = if mutated {
                        store.save(&key, &next).await.map(|()| decision)
                    } else {
                        Ok(decision)
                    };
                    let _ = reply.send(result);
                }
            }
        }
        debug!(key = %key, "rate-limit actor idle, exiting");
    });

    KeyActorHandle { tx }
}
