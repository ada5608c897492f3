//! Wire transport for tracked events.
//!
//! The collector exposes two endpoints relative to the configured base URL:
//! - `POST {api_url}/save`: store the event, response body ignored
//! - `POST {api_url}/analyze`: store and analyze, response body is the result
//!
//! Every request carries `Authorization: Bearer {api_key}` and a JSON body.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;

use crate::config::ClientConfig;
use crate::error::{ClientError, DeliveryError};
use crate::event::LlmOutput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Save,
    Analyze,
}

impl Endpoint {
    pub fn for_event(event: &LlmOutput) -> Self {
        if event.needs_analysis() {
            Self::Analyze
        } else {
            Self::Save
        }
    }

    pub const fn path(&self) -> &'static str {
        match self {
            Endpoint::Save => "/save",
            Endpoint::Analyze => "/analyze",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// One request/response exchange with the collector. Implementations make a
/// single attempt; retrying is the caller's job.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Post one event and return the raw response body on a 2xx status.
    async fn post(&self, endpoint: Endpoint, event: &LlmOutput) -> Result<String, DeliveryError>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    headers: reqwest::header::HeaderMap,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let api_key = config.effective_api_key().ok_or_else(|| {
            ClientError::Config("HTTP transport requires an API key".to_string())
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| ClientError::Runtime(format!("failed to create HTTP client: {e}")))?;

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            reqwest::header::AUTHORIZATION,
            format!("Bearer {api_key}")
                .parse()
                .map_err(|e| ClientError::Config(format!("invalid API key header: {e}")))?,
        );

        Ok(Self {
            client,
            base_url: config.api_url.trim().trim_end_matches('/').to_string(),
            headers,
        })
    }

    pub fn url_for(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, endpoint: Endpoint, event: &LlmOutput) -> Result<String, DeliveryError> {
        let url = self.url_for(endpoint);
        let body = serde_json::to_vec(event)?;

        trace!("posting event to {url}");
        let response = self
            .client
            .post(&url)
            .headers(self.headers.clone())
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        Ok(text)
    }
}
