//! [`HttpTransport`]: the `reqwest` implementation of [`ChatTransport`].

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use gateway::{ChatTransport, DispatchError, OutboundRequest, RetryPolicy};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::retry::{parse_retry_after, Backoff};

/// Errors constructing the transport itself.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),
}

/// Transport-wide settings. Per-request settings on [`OutboundRequest`]
/// override these.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpTransportConfig {
    /// Timeout applied when a request carries none.
    pub default_timeout: Option<Duration>,
    /// Retry delay schedule.
    pub backoff: Backoff,
    pub user_agent: String,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            default_timeout: Some(Duration::from_secs(60)),
            backoff: Backoff::default(),
            user_agent: concat!("helicone-node/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Sends gateway requests with a shared connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    config: HttpTransportConfig,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { client, config })
    }

    fn timeout_for(&self, request: &OutboundRequest) -> Option<Duration> {
        request.timeout.or(self.config.default_timeout)
    }

    async fn send_once(&self, request: &OutboundRequest) -> Result<Value, DispatchError> {
        let timeout = self.timeout_for(request);
        let mut builder = self
            .client
            .post(&request.url)
            .headers(encode_headers(request)?)
            .json(&request.body);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                DispatchError::Timeout {
                    url: request.url.clone(),
                    timeout: timeout.unwrap_or_default(),
                }
            } else if e.is_builder() {
                DispatchError::InvalidRequest {
                    message: e.to_string(),
                }
            } else {
                DispatchError::Connection {
                    url: request.url.clone(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| parse_retry_after(v, Utc::now()));
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                DispatchError::Timeout {
                    url: request.url.clone(),
                    timeout: timeout.unwrap_or_default(),
                }
            } else {
                DispatchError::Connection {
                    url: request.url.clone(),
                    message: format!("failed to read response body: {e}"),
                }
            }
        })?;

        if !status.is_success() {
            return Err(DispatchError::Status {
                status: status.as_u16(),
                body: text,
                retry_after,
            });
        }

        serde_json::from_str(&text).map_err(|e| DispatchError::InvalidResponse {
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    #[instrument(skip_all, fields(url = %request.url, max_retries = request.max_retries))]
    async fn send(&self, request: &OutboundRequest) -> Result<Value, DispatchError> {
        let mut attempt: u32 = 0;
        loop {
            let err = match self.send_once(request).await {
                Ok(body) => {
                    debug!(attempt, "Gateway request succeeded");
                    return Ok(body);
                }
                Err(err) => err,
            };

            let after = match err.retry_policy() {
                RetryPolicy::Retryable { after } if attempt < request.max_retries => after,
                _ => return Err(err),
            };
            let delay = after.map_or_else(
                || self.config.backoff.delay(attempt),
                |d| self.config.backoff.clamp(d),
            );
            warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "Retrying gateway request"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

fn encode_headers(request: &OutboundRequest) -> Result<HeaderMap, DispatchError> {
    let mut map = HeaderMap::with_capacity(request.headers.len());
    for (name, value) in &request.headers {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| DispatchError::InvalidRequest {
                message: format!("invalid header name '{name}': {e}"),
            })?;
        // Values are not echoed: they may be credentials.
        let header_value =
            HeaderValue::from_str(value).map_err(|_| DispatchError::InvalidRequest {
                message: format!("invalid value for header '{name}'"),
            })?;
        map.insert(header_name, header_value);
    }
    Ok(map)
}
