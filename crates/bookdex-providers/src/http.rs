//! HTTP backend abstraction shared by every provider client.
//!
//! The trait exists for dependency injection: production uses reqwest, tests
//! use the canned fake. Deliberately no retry logic here: clients report
//! exactly one attempt and the orchestrator owns fallback.

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Transport-level failure, before provider classification.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HttpError {
    /// Non-2xx status.
    #[error("http status {status}")]
    Status {
        status: u16,
        /// Parsed Retry-After header, seconds, when the provider sent one.
        retry_after: Option<u64>,
    },
    /// 2xx response whose body was not parseable JSON.
    #[error("response body was not JSON: {0}")]
    NonJson(String),
    /// Connection refusal, DNS failure, TLS failure.
    #[error("network error: {0}")]
    Network(String),
}

/// Optional auth attached to a request.
#[derive(Clone, Copy, Debug)]
pub enum RequestAuth<'a> {
    None,
    /// `Authorization: Bearer <key>`
    Bearer(&'a str),
    /// Raw header value, e.g. the registry's `Authorization: <key>`.
    Header(&'a str, &'a str),
}

/// Trait for HTTP backends that fetch JSON.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    async fn get_json(&self, url: &Url, auth: RequestAuth<'_>)
    -> Result<serde_json::Value, HttpError>;

    async fn post_json(
        &self,
        url: &Url,
        body: &serde_json::Value,
        auth: RequestAuth<'_>,
    ) -> Result<serde_json::Value, HttpError>;
}

/// Production backend. One attempt per call; the caller owns the deadline
/// (dropping the future aborts the underlying request).
pub struct ReqwestBackend {
    client: reqwest::Client,
}

impl ReqwestBackend {
    #[must_use]
    pub fn new() -> Self {
        // No client-level timeout: the per-operation deadline wraps the call.
        Self { client: reqwest::Client::new() }
    }

    fn apply_auth(
        request: reqwest::RequestBuilder,
        auth: RequestAuth<'_>,
    ) -> reqwest::RequestBuilder {
        match auth {
            RequestAuth::None => request,
            RequestAuth::Bearer(key) => request.header("Authorization", format!("Bearer {key}")),
            RequestAuth::Header(name, value) => request.header(name, value),
        }
    }

    async fn decode(response: reqwest::Response) -> Result<serde_json::Value, HttpError> {
        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse().ok());
            return Err(HttpError::Status { status: status.as_u16(), retry_after });
        }
        response
            .json()
            .await
            .map_err(|e| HttpError::NonJson(e.to_string()))
    }
}

impl Default for ReqwestBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn get_json(
        &self,
        url: &Url,
        auth: RequestAuth<'_>,
    ) -> Result<serde_json::Value, HttpError> {
        let request = Self::apply_auth(self.client.get(url.as_str()), auth);
        let response = request
            .send()
            .await
            .map_err(|e| HttpError::Network(e.to_string()))?;
        Self::decode(response).await
    }

    async fn post_json(
        &self,
        url: &Url,
        body: &serde_json::Value,
        auth: RequestAuth<'_>,
    ) -> Result<serde_json::Value, HttpError> {
        let request = Self::apply_auth(self.client.post(url.as_str()), auth).json(body);
        let response = request
            .send()
            .await
            .map_err(|e| HttpError::Network(e.to_string()))?;
        Self::decode(response).await
    }
}

// ============================================================================
// Fake backend for tests
// ============================================================================
