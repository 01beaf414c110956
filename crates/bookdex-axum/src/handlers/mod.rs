//! HTTP and WebSocket handlers.

pub mod enrich;
pub mod health;
pub mod jobs;
pub mod progress_ws;
