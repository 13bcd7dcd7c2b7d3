use crate::domain::errors::{FetchResult, TransportError};
use crate::domain::logging::{LogComponent, get_logger};
use crate::domain::metrics::{MetricsSource, RangeToken, Series};
use gloo_net::http::Request;
use serde::{Deserialize, Serialize};

/// Body of `GET /api/metrics`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsResponse {
    pub data: Series,
}

/// HTTP adapter for the metrics endpoint
#[derive(Debug, Clone)]
pub struct HttpMetricsSource {
    base_url: String,
}

impl Default for HttpMetricsSource {
    /// Same-origin requests
    fn default() -> Self {
        Self::new("")
    }
}

impl HttpMetricsSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    pub fn metrics_url(&self, token: RangeToken) -> String {
        format!("{}/api/metrics?timeRange={}", self.base_url.trim_end_matches('/'), token.as_param())
    }
}

impl MetricsSource for HttpMetricsSource {
    async fn fetch(&self, token: RangeToken) -> FetchResult<Series> {
        let url = self.metrics_url(token);
        get_logger().debug(LogComponent::Infrastructure("MetricsHttp"), &format!("🌐 GET: {url}"));

        let response = Request::get(&url)
            .send()
            .await
            .map_err(|e| TransportError::Network(format!("Request failed: {e}")))?;

        if !response.ok() {
            return Err(TransportError::Status { status: response.status(), text: response.status_text() });
        }

        let body: MetricsResponse =
            response.json().await.map_err(|e| TransportError::Decode(format!("Failed to parse JSON: {e}")))?;

        get_logger().debug(
            LogComponent::Infrastructure("MetricsHttp"),
            &format!("✅ {} samples for {}", body.data.len(), token),
        );
        Ok(body.data)
    }
}

/// Decode a raw `/api/metrics` body.
pub fn parse_metrics_body(body: &str) -> FetchResult<Series> {
    serde_json::from_str::<MetricsResponse>(body)
        .map(|response| response.data)
        .map_err(|e| TransportError::Decode(e.to_string()))
}
