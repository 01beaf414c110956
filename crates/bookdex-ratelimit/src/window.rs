//! Fixed-window counter state machine.
//!
//! Pure and synchronous: the owning actor provides serialization, this
//! module provides determinism. Same inputs, same outputs.

use serde::{Deserialize, Serialize};

/// Persisted per-key window state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowState {
    pub count: u32,
    /// Epoch milliseconds.
    pub window_started_at_ms: i64,
    pub window_expires_at_ms: i64,
}

/// Outcome of one admission check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: u32,
    /// When the current window ends, epoch milliseconds.
    pub reset_at_ms: i64,
}

impl RateDecision {
    /// Whole seconds until the window resets (at least 1 for denials, so a
    /// `Retry-After` header is never zero).
    #[must_use]
    pub const fn retry_after_seconds(&self, now_ms: i64) -> u64 {
        let remaining_ms = self.reset_at_ms - now_ms;
        if remaining_ms <= 0 {
            1
        } else {
            // Round up so clients never retry early.
            let secs = (remaining_ms + 999) / 1000;
            secs as u64
        }
    }
}

/// Apply one admission check to the window.
///
/// Returns the (possibly reset, possibly incremented) state together with
/// the decision. Denials do not increment: `max` admits per window means
/// exactly `max`, no matter how many checks arrive.
#[must_use]
pub fn check_and_increment(
    state: Option<WindowState>,
    now_ms: i64,
    window_ms: i64,
    max_requests: u32,
) -> (WindowState, RateDecision, bool) {
    let mut state = match state {
        Some(state) if now_ms < state.window_expires_at_ms => state,
        _ => WindowState {
            count: 0,
            window_started_at_ms: now_ms,
            window_expires_at_ms: now_ms + window_ms,
        },
    };

    if state.count < max_requests {
        state.count += 1;
        let decision = RateDecision {
            allowed: true,
            remaining: max_requests - state.count,
            reset_at_ms: state.window_expires_at_ms,
        };
        (state, decision, true)
    } else {
        let decision = RateDecision {
            allowed: false,
            remaining: 0,
            reset_at_ms: state.window_expires_at_ms,
        };
        (state, decision, false)
    }
}
