//! Provider ports: one trait per upstream, shared outcome shape.
//!
//! Contract common to every operation on every port:
//!
//! - 5000 ms hard deadline, enforced by the client; expiry yields a
//!   `Timeout` failure and aborts the underlying request.
//! - No retries inside the client; fallback is the orchestrator's concern.
//! - An absent API key yields `NoApiKey` without issuing any request.
//! - Every call is recorded to the analytics sink.

mod openbib;
mod outcome;
mod registry;
mod vision;
mod volume;

pub use openbib::{OpenBibDoc, OpenBibPort, OpenBibSearchPayload};
pub use outcome::{ProviderErrorKind, ProviderFailure, ProviderResponse};
pub use registry::{IsbnRegistryPort, RegistryBook};
pub use vision::{CsvParsePayload, CsvRow, ImageSource, ScannedBook, ShelfScanPayload, VisionModelPort};
pub use volume::{VolumeCatalogPort, VolumeHit, VolumeSearchPayload};
