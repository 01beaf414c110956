//! Axum adapter for bookdex: the response envelope, error mapping, rate
//! limit middleware, enrichment and job handlers, the progress-WebSocket
//! upgrade, and the composition root that wires concrete adapters into the
//! core.

#![deny(unsafe_code)]

pub mod bootstrap;
pub mod dto;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use bootstrap::{ProviderCredentials, build_state, serve};
pub use routes::router;
pub use state::AppState;
