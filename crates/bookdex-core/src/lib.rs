//! Core domain types, normalization, and port definitions for bookdex.
//!
//! This crate is the dependency root of the workspace: canonical
//! `Work`/`Edition`/`Author` records, the job state machine and message
//! envelope, the stable error taxonomy, service configuration, and the port
//! traits adapters implement. No I/O happens here.

#![deny(unsafe_code)]

pub mod config;
pub mod domain;
pub mod error;
pub mod job;
pub mod normalize;
pub mod ports;

// Re-export commonly used types for convenience
pub use config::{CacheTtls, CoreConfig};
pub use domain::{
    Author, CacheSource, Edition, EditionFormat, EnrichOutcome, EnrichedResponse, Gender,
    ProviderId, ReviewStatus, Work,
};
pub use error::ErrorCode;
pub use job::{
    ClientMessage, ENVELOPE_VERSION, InvalidTransition, JobPipeline, JobState, JobStatus,
    MessageType, ProgressMessage, TransitionOutcome,
};
pub use ports::{
    AnalyticsSink, AuthToken, Credential, JobStoreError, JobStorePort, LogAnalytics,
    NoopAnalytics, ProviderCall, SecretError, SecretSource,
};
