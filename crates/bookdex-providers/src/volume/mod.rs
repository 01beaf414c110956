//! Volume-catalog client.

mod parse;

use crate::call::{classify, run_operation};
use crate::config::ClientConfig;
use crate::http::{HttpBackend, RequestAuth};
use async_trait::async_trait;
use bookdex_core::domain::ProviderId;
use bookdex_core::ports::AnalyticsSink;
use bookdex_core::ports::providers::{
    ProviderErrorKind, ProviderFailure, ProviderResponse, VolumeCatalogPort, VolumeHit,
    VolumeSearchPayload,
};
use std::sync::Arc;
use url::Url;

const PROVIDER: ProviderId = ProviderId::VolumeCatalog;

/// Client for the commercial volume catalog. The API key rides as a query
/// parameter, the way this catalog wants it.
pub struct VolumeCatalogClient<B> {
    backend: B,
    config: ClientConfig,
    analytics: Arc<dyn AnalyticsSink>,
}

impl<B: HttpBackend> VolumeCatalogClient<B> {
    #[must_use]
    pub fn new(backend: B, config: ClientConfig, analytics: Arc<dyn AnalyticsSink>) -> Self {
        Self { backend, config, analytics }
    }

    /// Resolve the credential, failing fast with `NoApiKey` before any
    /// request goes out.
    async fn require_key(&self) -> Result<String, ProviderFailure> {
        match self.config.credential.resolve().await {
            Ok(Some(key)) => Ok(key),
            Ok(None) => Err(ProviderFailure::new(
                ProviderErrorKind::NoApiKey,
                "no volume-catalog API key configured",
            )),
            Err(e) => Err(ProviderFailure::new(ProviderErrorKind::NoApiKey, e.to_string())),
        }
    }

    fn search_url(&self, query: &str, max_results: u32, key: &str) -> Result<Url, ProviderFailure> {
        Url::parse(&format!(
            "{}/volumes?q={}&maxResults={}&key={}",
            self.config.base_url,
            urlencoding::encode(query),
            max_results.min(40),
            key,
        ))
        .map_err(|e| ProviderFailure::new(ProviderErrorKind::Provider, e.to_string()))
    }

    async fn run_search(&self, query: String, max_results: u32) -> Result<VolumeSearchPayload, ProviderFailure> {
        let key = self.require_key().await?;
        let url = self.search_url(&query, max_results, &key)?;
        let raw = self
            .backend
            .get_json(&url, RequestAuth::None)
            .await
            .map_err(classify)?;
        parse::parse_search(&raw).ok_or_else(|| {
            ProviderFailure::new(ProviderErrorKind::Provider, "unrecognized search response shape")
        })
    }
}

#[async_trait]
impl<B: HttpBackend> VolumeCatalogPort for VolumeCatalogClient<B> {
    async fn search_by_free_text(
        &self,
        query: &str,
        max_results: u32,
    ) -> ProviderResponse<VolumeSearchPayload> {
        run_operation(
            PROVIDER,
            "search_by_free_text",
            self.config.timeout_ms,
            self.analytics.as_ref(),
            |payload: &VolumeSearchPayload| payload.items.len(),
            self.run_search(query.to_string(), max_results),
        )
        .await
    }

    async fn search_by_isbn(&self, isbn: &str) -> ProviderResponse<VolumeSearchPayload> {
        run_operation(
            PROVIDER,
            "search_by_isbn",
            self.config.timeout_ms,
            self.analytics.as_ref(),
            |payload: &VolumeSearchPayload| payload.items.len(),
            self.run_search(format!("isbn:{isbn}"), 5),
        )
        .await
    }

    async fn search_by_volume_id(&self, volume_id: &str) -> ProviderResponse<VolumeHit> {
        let fut = async {
            let key = self.require_key().await?;
            let url = Url::parse(&format!(
                "{}/volumes/{}?key={}",
                self.config.base_url,
                urlencoding::encode(volume_id),
                key,
            ))
            .map_err(|e| ProviderFailure::new(ProviderErrorKind::Provider, e.to_string()))?;
            let raw = self
                .backend
                .get_json(&url, RequestAuth::None)
                .await
                .map_err(classify)?;
            parse::parse_volume(&raw).ok_or_else(|| {
                ProviderFailure::new(
                    ProviderErrorKind::Provider,
                    "unrecognized volume response shape",
                )
            })
        };
        run_operation(
            PROVIDER,
            "search_by_volume_id",
            self.config.timeout_ms,
            self.analytics.as_ref(),
            |_| 1,
            fut,
        )
        .await
    }
}
