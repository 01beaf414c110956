//! Open bibliographic database client. No API key required.

mod parse;

use crate::call::{classify, run_operation};
use crate::config::ClientConfig;
use crate::http::{HttpBackend, HttpError, RequestAuth};
use async_trait::async_trait;
use bookdex_core::domain::ProviderId;
use bookdex_core::ports::AnalyticsSink;
use bookdex_core::ports::providers::{
    OpenBibDoc, OpenBibPort, OpenBibSearchPayload, ProviderErrorKind, ProviderFailure,
    ProviderResponse,
};
use std::sync::Arc;
use url::Url;

const PROVIDER: ProviderId = ProviderId::OpenBib;

/// Client for the open bibliographic database.
pub struct OpenBibClient<B> {
    backend: B,
    config: ClientConfig,
    analytics: Arc<dyn AnalyticsSink>,
}

impl<B: HttpBackend> OpenBibClient<B> {
    #[must_use]
    pub fn new(backend: B, config: ClientConfig, analytics: Arc<dyn AnalyticsSink>) -> Self {
        Self { backend, config, analytics }
    }

    fn url(&self, path_and_query: &str) -> Result<Url, ProviderFailure> {
        Url::parse(&format!("{}{path_and_query}", self.config.base_url))
            .map_err(|e| ProviderFailure::new(ProviderErrorKind::Provider, e.to_string()))
    }
}

#[async_trait]
impl<B: HttpBackend> OpenBibPort for OpenBibClient<B> {
    async fn search(&self, query: &str, limit: u32) -> ProviderResponse<OpenBibSearchPayload> {
        let fut = async {
            let url = self.url(&format!(
                "/search.json?q={}&limit={}",
                urlencoding::encode(query),
                limit.min(100),
            ))?;
            let raw = self
                .backend
                .get_json(&url, RequestAuth::None)
                .await
                .map_err(classify)?;
            parse::parse_search(&raw).ok_or_else(|| {
                ProviderFailure::new(
                    ProviderErrorKind::Provider,
                    "unrecognized search response shape",
                )
            })
        };
        run_operation(
            PROVIDER,
            "search",
            self.config.timeout_ms,
            self.analytics.as_ref(),
            |payload: &OpenBibSearchPayload| payload.docs.len(),
            fut,
        )
        .await
    }

    async fn lookup_isbn(&self, isbn: &str) -> ProviderResponse<Option<OpenBibDoc>> {
        let fut = async {
            let url = self.url(&format!("/isbn/{}.json", urlencoding::encode(isbn)))?;
            match self.backend.get_json(&url, RequestAuth::None).await {
                Ok(raw) => Ok(parse::parse_edition(&raw)),
                // An unknown ISBN is a successful miss, not a failure.
                Err(HttpError::Status { status: 404, .. }) => Ok(None),
                Err(e) => Err(classify(e)),
            }
        };
        run_operation(
            PROVIDER,
            "lookup_isbn",
            self.config.timeout_ms,
            self.analytics.as_ref(),
            |payload: &Option<OpenBibDoc>| usize::from(payload.is_some()),
            fut,
        )
        .await
    }
}
