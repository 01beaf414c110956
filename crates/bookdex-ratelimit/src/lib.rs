//! Per-key fixed-window rate limiting for bookdex.
//!
//! One single-writer actor per key guarantees exactly N admits per window
//! even under concurrent arrival. Window state persists through a store
//! port; substrate failures surface as errors so the HTTP middleware can
//! fail open.

#![deny(unsafe_code)]

mod actor;
mod limiter;
mod store;
mod window;

pub use limiter::{LimiterError, RateLimiter};
pub use store::{MemoryRateStore, RateStoreError, RateWindowStore};
pub use window::{RateDecision, WindowState, check_and_increment};
