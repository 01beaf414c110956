//! Typed upstream provider clients for bookdex.
//!
//! One client per provider, all sharing the [`http::HttpBackend`]
//! abstraction so tests run against canned JSON. Every operation obeys the
//! same contract: one attempt, a hard 5 s deadline, classified failures,
//! and an analytics record per call. Retry and fallback live in the
//! orchestrator, never here.

#![deny(unsafe_code)]

mod call;
mod config;
mod http;
mod openbib;
mod registry;
mod vision;
mod volume;

pub use config::ClientConfig;
pub use http::{HttpBackend, HttpError, RequestAuth, ReqwestBackend};
pub use openbib::OpenBibClient;
pub use registry::IsbnRegistryClient;
pub use vision::VisionModelClient;
pub use volume::VolumeCatalogClient;
