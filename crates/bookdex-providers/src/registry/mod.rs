//! ISBN-registry client. The key rides in the Authorization header.

mod parse;

use crate::call::{classify, run_operation};
use crate::config::ClientConfig;
use crate::http::{HttpBackend, HttpError, RequestAuth};
use async_trait::async_trait;
use bookdex_core::domain::ProviderId;
use bookdex_core::ports::AnalyticsSink;
use bookdex_core::ports::providers::{
    IsbnRegistryPort, ProviderErrorKind, ProviderFailure, ProviderResponse, RegistryBook,
};
use std::sync::Arc;
use url::Url;

const PROVIDER: ProviderId = ProviderId::IsbnRegistry;

/// Client for the ISBN registry.
pub struct IsbnRegistryClient<B> {
    backend: B,
    config: ClientConfig,
    analytics: Arc<dyn AnalyticsSink>,
}

impl<B: HttpBackend> IsbnRegistryClient<B> {
    #[must_use]
    pub fn new(backend: B, config: ClientConfig, analytics: Arc<dyn AnalyticsSink>) -> Self {
        Self { backend, config, analytics }
    }
}

#[async_trait]
impl<B: HttpBackend> IsbnRegistryPort for IsbnRegistryClient<B> {
    async fn lookup_isbn(&self, isbn: &str) -> ProviderResponse<Option<RegistryBook>> {
        let fut = async {
            let key = match self.config.credential.resolve().await {
                Ok(Some(key)) => key,
                Ok(None) => {
                    return Err(ProviderFailure::new(
                        ProviderErrorKind::NoApiKey,
                        "no ISBN-registry API key configured",
                    ));
                }
                Err(e) => {
                    return Err(ProviderFailure::new(ProviderErrorKind::NoApiKey, e.to_string()));
                }
            };

            let url = Url::parse(&format!(
                "{}/book/{}",
                self.config.base_url,
                urlencoding::encode(isbn)
            ))
            .map_err(|e| ProviderFailure::new(ProviderErrorKind::Provider, e.to_string()))?;

            match self
                .backend
                .get_json(&url, RequestAuth::Header("Authorization", &key))
                .await
            {
                Ok(raw) => Ok(parse::parse_book(&raw)),
                // Unregistered ISBN: a successful miss.
                Err(HttpError::Status { status: 404, .. }) => Ok(None),
                Err(e) => Err(classify(e)),
            }
        };
        run_operation(
            PROVIDER,
            "lookup_isbn",
            self.config.timeout_ms,
            self.analytics.as_ref(),
            |payload: &Option<RegistryBook>| usize::from(payload.is_some()),
            fut,
        )
        .await
    }
}
