//! Provider credential resolution.
//!
//! Credentials are either configured directly or fetched lazily from a
//! secret backend. Clients resolve the credential per call; an absent key
//! short-circuits to `NoApiKey` before any request is issued.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Failure to fetch a deferred secret.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("secret resolution failed: {0}")]
pub struct SecretError(pub String);

/// Deferred secret backend (vault, environment service, ...).
#[async_trait]
pub trait SecretSource: Send + Sync {
    async fn get(&self) -> Result<String, SecretError>;
}

/// An API credential for one provider.
#[derive(Clone, Default)]
pub enum Credential {
    /// No credential configured.
    #[default]
    Absent,
    /// Key supplied directly in configuration.
    Direct(String),
    /// Key fetched on demand from a secret backend.
    Deferred(Arc<dyn SecretSource>),
}

impl Credential {
    /// Resolve to a concrete key. `Ok(None)` means no key is configured.
    pub async fn resolve(&self) -> Result<Option<String>, SecretError> {
        match self {
            Self::Absent => Ok(None),
            Self::Direct(key) => Ok(Some(key.clone())),
            Self::Deferred(source) => source.get().await.map(Some),
        }
    }

    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

// Never print key material, even in debug output.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "Credential::Absent"),
            Self::Direct(_) => write!(f, "Credential::Direct(<redacted>)"),
            Self::Deferred(_) => write!(f, "Credential::Deferred(<source>)"),
        }
    }
}
