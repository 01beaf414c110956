//! Capability tokens: opaque, job-scoped, bounded lifetime.

use crate::error::JobError;
use bookdex_core::ports::AuthToken;
use uuid::Uuid;

/// Mint a fresh opaque token.
#[must_use]
pub fn mint_token() -> String {
    format!("jt_{}", Uuid::new_v4().simple())
}

/// Validate a presented token against the stored one.
pub fn validate(stored: Option<&AuthToken>, presented: &str, now_ms: i64) -> Result<(), JobError> {
    let stored = stored.ok_or(JobError::NoToken)?;
    if stored.token != presented {
        return Err(JobError::InvalidToken);
    }
    if stored.is_expired(now_ms) {
        return Err(JobError::TokenExpired);
    }
    Ok(())
}

/// Check whether a refresh request is allowed right now.
///
/// Refreshes are only accepted in the final `refresh_window_ms` of the
/// token's life: a wrong token, an expired token, or a too-early request
/// each fail with their own explicit error.
pub fn refresh_allowed(
    stored: Option<&AuthToken>,
    presented: &str,
    now_ms: i64,
    refresh_window_ms: i64,
) -> Result<(), JobError> {
    let stored = stored.ok_or(JobError::NoToken)?;
    if stored.token != presented {
        return Err(JobError::InvalidToken);
    }
    if stored.is_expired(now_ms) {
        return Err(JobError::TokenExpired);
    }
    if stored.remaining_ms(now_ms) > refresh_window_ms {
        return Err(JobError::RefreshTooEarly);
    }
    Ok(())
}
