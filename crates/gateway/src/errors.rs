//! Error and retry-policy types for the Helicone gateway domain.
//!
//! [`GatewayError`] covers conditions detected while turning node parameters
//! into an [`crate::OutboundRequest`]; nothing has been sent when one of these
//! is returned. [`DispatchError`] covers failures of the transport that sends
//! the request.
//!
//! [`RetryPolicy`] is a cross-cutting concern: any error type that participates
//! in retry decisions must be able to produce a [`RetryPolicy`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// Returned by [`DispatchError::retry_policy`] to let the transport decide
/// whether to re-send a request.
///
/// ## Rules
///
/// - `Retryable` errors: connection failures, timeouts, HTTP 429, HTTP 5xx.
/// - `NonRetryable` errors: any other HTTP status, unencodable requests,
///   undecodable responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    ///
    /// `after` optionally specifies the minimum delay before retrying (e.g.
    /// derived from a `Retry-After` response header).
    Retryable {
        /// Minimum back-off before the next attempt. `None` means apply the
        /// caller's own back-off schedule.
        after: Option<Duration>,
    },
    /// The operation must not be retried.
    NonRetryable,
}

impl RetryPolicy {
    /// Returns `true` for [`RetryPolicy::Retryable`].
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Retryable { .. })
    }
}

// ---------------------------------------------------------------------------
// Request construction errors
// ---------------------------------------------------------------------------

/// Errors raised while building an outbound request.
///
/// All of these are surfaced before any network traffic happens. Malformed
/// custom-properties JSON is deliberately *not* represented here: it is logged
/// and skipped by the builder.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A required parameter is missing or has an invalid value.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// The messages parameter is not a JSON array of `{role, content}` objects.
    #[error("Invalid messages: {reason}")]
    InvalidMessages {
        /// Why the messages could not be used.
        reason: String,
    },

    /// The request body could not be serialised.
    #[error("Failed to serialise request body: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GatewayError {
    /// Shorthand for [`GatewayError::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch errors
// ---------------------------------------------------------------------------

/// Errors produced by a [`crate::ChatTransport`] while sending a request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request could not be delivered (DNS, connect, TLS, reset).
    #[error("Request to {url} failed: {message}")]
    Connection {
        /// Target URL.
        url: String,
        /// Underlying transport message.
        message: String,
    },

    /// No response arrived within the configured timeout.
    #[error("Request to {url} timed out after {timeout:?}")]
    Timeout {
        /// Target URL.
        url: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The gateway answered with a non-success status.
    #[error("Gateway returned HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body text, verbatim.
        body: String,
        /// Delay requested by a `Retry-After` header, if any.
        retry_after: Option<Duration>,
    },

    /// The request could not be encoded for the wire (e.g. an invalid header
    /// value). Never retried.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// What was wrong with the request.
        message: String,
    },

    /// A success response whose body is not JSON.
    #[error("Invalid response body: {message}")]
    InvalidResponse {
        /// Decoder message.
        message: String,
    },
}

impl DispatchError {
    /// Classifies this error for the transport's retry loop.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            Self::Connection { .. } | Self::Timeout { .. } => {
                RetryPolicy::Retryable { after: None }
            }
            Self::Status {
                status,
                retry_after,
                ..
            } if *status == 429 || (500..600).contains(status) => RetryPolicy::Retryable {
                after: *retry_after,
            },
            Self::Status { .. } | Self::InvalidRequest { .. } | Self::InvalidResponse { .. } => {
                RetryPolicy::NonRetryable
            }
        }
    }
}
