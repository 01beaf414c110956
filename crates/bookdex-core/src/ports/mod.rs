//! Port definitions: the traits adapters implement and the core consumes.

mod analytics;
mod job_store;
pub mod providers;
mod secret;

pub use analytics::{AnalyticsSink, LogAnalytics, NoopAnalytics, ProviderCall};
pub use job_store::{AuthToken, JobStoreError, JobStorePort};
pub use secret::{Credential, SecretError, SecretSource};
