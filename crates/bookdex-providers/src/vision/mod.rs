//! Multimodal-model client: bookshelf scans and CSV understanding.

mod parse;

use crate::call::{classify, run_operation};
use crate::config::ClientConfig;
use crate::http::{HttpBackend, RequestAuth};
use async_trait::async_trait;
use bookdex_core::domain::ProviderId;
use bookdex_core::ports::AnalyticsSink;
use bookdex_core::ports::providers::{
    CsvParsePayload, ImageSource, ProviderErrorKind, ProviderFailure, ProviderResponse,
    ShelfScanPayload, VisionModelPort,
};
use serde_json::json;
use std::sync::Arc;
use url::Url;

const PROVIDER: ProviderId = ProviderId::VisionModel;

/// Client for the multimodal model. Both operations are single POST
/// requests; rate-limit and quota answers from the model are surfaced
/// intact so pipelines can report them as retryable.
pub struct VisionModelClient<B> {
    backend: B,
    config: ClientConfig,
    analytics: Arc<dyn AnalyticsSink>,
}

impl<B: HttpBackend> VisionModelClient<B> {
    #[must_use]
    pub fn new(backend: B, config: ClientConfig, analytics: Arc<dyn AnalyticsSink>) -> Self {
        Self { backend, config, analytics }
    }

    async fn require_key(&self) -> Result<String, ProviderFailure> {
        match self.config.credential.resolve().await {
            Ok(Some(key)) => Ok(key),
            Ok(None) => Err(ProviderFailure::new(
                ProviderErrorKind::NoApiKey,
                "no model API key configured",
            )),
            Err(e) => Err(ProviderFailure::new(ProviderErrorKind::NoApiKey, e.to_string())),
        }
    }

    async fn generate(&self, body: serde_json::Value) -> Result<serde_json::Value, ProviderFailure> {
        let key = self.require_key().await?;
        let url = Url::parse(&format!("{}/generate", self.config.base_url))
            .map_err(|e| ProviderFailure::new(ProviderErrorKind::Provider, e.to_string()))?;
        self.backend
            .post_json(&url, &body, RequestAuth::Bearer(&key))
            .await
            .map_err(classify)
    }
}

#[async_trait]
impl<B: HttpBackend> VisionModelPort for VisionModelClient<B> {
    async fn scan_image(&self, image: &ImageSource) -> ProviderResponse<ShelfScanPayload> {
        let body = json!({
            "task": "bookshelf_scan",
            "image": image,
            "response_format": "json",
        });
        let fut = async {
            let raw = self.generate(body).await?;
            parse::parse_scan(&raw).ok_or_else(|| {
                ProviderFailure::new(
                    ProviderErrorKind::Provider,
                    "model answer had no recognizable book list",
                )
            })
        };
        run_operation(
            PROVIDER,
            "scan_image",
            self.config.timeout_ms,
            self.analytics.as_ref(),
            |payload: &ShelfScanPayload| payload.books.len(),
            fut,
        )
        .await
    }

    async fn parse_csv(&self, csv_text: &str) -> ProviderResponse<CsvParsePayload> {
        let body = json!({
            "task": "csv_parse",
            "csv": csv_text,
            "response_format": "json",
        });
        let fut = async {
            let raw = self.generate(body).await?;
            parse::parse_csv_rows(&raw).ok_or_else(|| {
                ProviderFailure::new(
                    ProviderErrorKind::Provider,
                    "model answer had no recognizable row list",
                )
            })
        };
        run_operation(
            PROVIDER,
            "parse_csv",
            self.config.timeout_ms,
            self.analytics.as_ref(),
            |payload: &CsvParsePayload| payload.rows.len(),
            fut,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpError;
    use crate::http::testing::FakeBackend;
    use bookdex_core::ports::{Credential, NoopAnalytics};

    fn client(backend: FakeBackend) -> VisionModelClient<FakeBackend> {
        let config = ClientConfig::new(
            "https://model.example/v1",
            Credential::Direct("model-key".to_string()),
            5_000,
        );
        VisionModelClient::new(backend, config, Arc::new(NoopAnalytics))
    }

    #[tokio::test]
    async fn test_scan_image_parses_books() {
        let backend = FakeBackend::new().with_json(
            "generate",
            json!({"books": [{"title": "Dune", "author": "Frank Herbert"}]}),
        );
        let image = ImageSource::Url { url: "https://photos.example/shelf.jpg".to_string() };
        let response = client(backend).scan_image(&image).await;

        let payload = response.outcome.unwrap();
        assert_eq!(payload.books.len(), 1);
    }

    #[tokio::test]
    async fn test_parse_csv_returns_rows() {
        let backend = FakeBackend::new().with_json(
            "generate",
            json!({"rows": [{"title": "Dune", "author": "Frank Herbert"}]}),
        );
        let response = client(backend).parse_csv("title,author\nDune,Frank Herbert").await;

        assert_eq!(response.outcome.unwrap().rows.len(), 1);
    }

    #[tokio::test]
    async fn test_model_quota_error_surfaces_as_rate_limited() {
        let backend = FakeBackend::new()
            .with_error("generate", HttpError::Status { status: 429, retry_after: Some(60) });
        let response = client(backend).parse_csv("a,b").await;

        let failure = response.outcome.unwrap_err();
        assert_eq!(failure.kind, ProviderErrorKind::RateLimited);
        assert_eq!(failure.retry_after_seconds, Some(60));
    }

    #[tokio::test]
    async fn test_prose_answer_is_a_provider_failure() {
        let backend =
            FakeBackend::new().with_json("generate", json!({"text": "Sure! Here are the books"}));
        let image = ImageSource::Base64 { data: "aGVsbG8=".to_string() };
        let response = client(backend).scan_image(&image).await;

        assert_eq!(response.outcome.unwrap_err().kind, ProviderErrorKind::Provider);
    }
}
