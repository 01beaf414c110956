//! Per-provider client configuration.

use bookdex_core::ports::Credential;

/// Configuration for one provider client.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// API root, no trailing slash.
    pub base_url: String,
    pub credential: Credential,
    /// Hard per-operation deadline, milliseconds.
    pub timeout_ms: u64,
}

impl ClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>, credential: Credential, timeout_ms: u64) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url, credential, timeout_ms }
    }

    /// Volume catalog defaults (key passed as a query parameter).
    #[must_use]
    pub fn volume_catalog(credential: Credential, timeout_ms: u64) -> Self {
        Self::new("https://api.volumecatalog.example/v1", credential, timeout_ms)
    }

    /// Open bibliographic database defaults (no key required).
    #[must_use]
    pub fn open_bib(timeout_ms: u64) -> Self {
        Self::new("https://openbib.example", Credential::Absent, timeout_ms)
    }

    /// ISBN registry defaults (key passed in the Authorization header).
    #[must_use]
    pub fn isbn_registry(credential: Credential, timeout_ms: u64) -> Self {
        Self::new("https://api.isbnregistry.example/v2", credential, timeout_ms)
    }

    /// Multimodal model defaults (bearer key).
    #[must_use]
    pub fn vision_model(credential: Credential, timeout_ms: u64) -> Self {
        Self::new("https://model.example/v1", credential, timeout_ms)
    }
}
