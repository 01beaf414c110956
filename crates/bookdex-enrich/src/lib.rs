//! Enrichment for bookdex: provider fan-out with deterministic fallback,
//! quality-scored merging into canonical records, and write-through caching.
//!
//! The orchestrator is best-effort: upstream failures degrade the result's
//! completeness but never surface as caller-visible errors; only input
//! validation fails a request.

#![deny(unsafe_code)]

mod editions;
mod error;
mod merge;
mod normalize;
mod orchestrator;

pub use error::EnrichError;
pub use normalize::{ProviderRecords, normalize_book, normalize_doc, normalize_hit};
pub use orchestrator::{
    AdvancedQuery, BookQuery, BookResult, EnrichDeps, Enricher, EnrichmentPort,
};
