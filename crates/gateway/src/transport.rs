//! Port trait for sending built requests.
//!
//! The `llm` crate supplies the HTTP implementation; tests and dry runs supply
//! their own.

use async_trait::async_trait;
use serde_json::Value;

use crate::{DispatchError, OutboundRequest};

/// Sends an [`OutboundRequest`] and returns the decoded JSON response.
///
/// Implementations own timeout and retry handling, driven by
/// [`OutboundRequest::timeout`] and [`OutboundRequest::max_retries`].
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, request: &OutboundRequest) -> Result<Value, DispatchError>;
}
