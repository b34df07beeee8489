//! HTTP client for the remote scoring service.
//!
//! - `POST {base}/analyze/?strategy={strategy}`
//! - `POST {base}/suggest/`
//!
//! Both send the payload as a JSON array and expect a JSON array of scored
//! tasks back. On a non-2xx response the body's `message` (or `error`)
//! field becomes the failure text.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use super::traits::{ScoringApi, SubmissionPayload};
use crate::config::ApiConfig;
use crate::error::{ConfigError, TransportError};
use crate::task::{ScoredTask, Strategy};

const FALLBACK_MESSAGE: &str = "Server Error";

pub struct HttpScoringClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpScoringClient {
    /// Build a client for `base_url` (e.g. `http://127.0.0.1:8000/api`).
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not an absolute http(s) URL or
    /// the HTTP client cannot be constructed.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let parsed = Url::parse(base_url).map_err(|e| ConfigError::InvalidValue {
            key: "api.base_url".into(),
            message: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                key: "api.base_url".into(),
                message: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                key: "api.timeout_secs".into(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self, ConfigError> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    fn endpoint(&self, operation: &str) -> Result<Url, TransportError> {
        Url::parse(&format!("{}/{operation}/", self.base_url))
            .map_err(|e| TransportError::Network(e.to_string()))
    }

    pub fn analyze_url(&self, strategy: Strategy) -> Result<Url, TransportError> {
        let mut url = self.endpoint("analyze")?;
        url.query_pairs_mut().append_pair("strategy", strategy.as_str());
        Ok(url)
    }

    pub fn suggest_url(&self) -> Result<Url, TransportError> {
        self.endpoint("suggest")
    }

    async fn post(
        &self,
        url: Url,
        payload: &SubmissionPayload,
    ) -> Result<Vec<ScoredTask>, TransportError> {
        tracing::debug!(%url, tasks = payload.len(), "scoring request");

        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.transport_error(e))?;

        if status.is_success() {
            return serde_json::from_slice::<Vec<ScoredTask>>(&body)
                .map_err(|e| TransportError::InvalidResponse(e.to_string()));
        }

        let message = failure_message(&body, status.as_u16());
        tracing::debug!(status = status.as_u16(), %message, "scoring request rejected");
        Err(TransportError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

/// Failure text for a non-2xx body: `message`, then `error`, then a
/// generic fallback. A body that is not JSON at all mentions the status.
fn failure_message(body: &[u8], status: u16) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(json) => ["message", "error"]
            .iter()
            .find_map(|key| json.get(key).and_then(Value::as_str).filter(|s| !s.is_empty()))
            .unwrap_or(FALLBACK_MESSAGE)
            .to_string(),
        Err(_) => format!("{FALLBACK_MESSAGE} (HTTP {status})"),
    }
}

#[async_trait]
impl ScoringApi for HttpScoringClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn analyze(
        &self,
        payload: &SubmissionPayload,
        strategy: Strategy,
    ) -> Result<Vec<ScoredTask>, TransportError> {
        let url = self.analyze_url(strategy)?;
        self.post(url, payload).await
    }

    async fn suggest(&self, payload: &SubmissionPayload) -> Result<Vec<ScoredTask>, TransportError> {
        let url = self.suggest_url()?;
        self.post(url, payload).await
    }
}
