//! Job-progress substrate for bookdex.
//!
//! Per-job single-writer actors own the WebSocket, the job state machine,
//! checkpointed persistence, capability tokens, and the cleanup alarm; the
//! pipeline drivers (batch enrichment, CSV import, bookshelf scan, single
//! enrichment) do their work through an actor handle and never touch state
//! directly.

#![deny(unsafe_code)]

mod actor;
mod error;
mod pipelines;
mod registry;
mod socket;
mod store;
mod token;

pub use actor::{PhotoStatus, ProgressHandle, ReadyWait, TerminalOutcome, TokenGrant};
pub use error::JobError;
pub use pipelines::{
    JobTicket, PipelineDeps, start_batch_enrichment, start_bookshelf_scan, start_csv_import,
    start_single_enrichment,
};
pub use registry::JobRegistry;
pub use socket::{CLOSE_NORMAL, ProgressSocket, SocketError, testing as socket_testing};
pub use store::MemoryJobStore;
pub use token::mint_token;
