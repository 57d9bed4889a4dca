//! Shared value types for chat-completion requests.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! values with invariants (temperature is in `[0.0, 2.0]`, a cache TTL is never
//! zero) and feed directly into request bodies and headers.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::GatewayError;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// One chat message, forwarded to the provider unchanged.
///
/// `content` is kept as raw JSON so that both plain strings and provider
/// content-part arrays pass through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Speaker role, e.g. `"user"`, `"assistant"`, `"system"`.
    pub role: String,
    /// Message content.
    pub content: Value,
}

impl ChatMessage {
    /// Creates a plain-text message.
    pub fn text(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: Value::String(content.into()),
        }
    }
}

/// Interprets a messages parameter.
///
/// Accepts either a JSON array or a string holding JSON array text (the form
/// a workflow editor stores). The array must be non-empty and every element
/// must be an object with a non-empty string `role` and a `content` field.
pub fn parse_messages(raw: &Value) -> Result<Vec<ChatMessage>, GatewayError> {
    let parsed;
    let value = match raw {
        Value::String(text) => {
            parsed = serde_json::from_str::<Value>(text).map_err(|e| {
                GatewayError::InvalidMessages {
                    reason: format!("not valid JSON: {e}"),
                }
            })?;
            &parsed
        }
        other => other,
    };

    let items = value.as_array().ok_or_else(|| GatewayError::InvalidMessages {
        reason: "expected a JSON array of messages".to_string(),
    })?;
    if items.is_empty() {
        return Err(GatewayError::InvalidMessages {
            reason: "at least one message is required".to_string(),
        });
    }

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let message: ChatMessage =
                serde_json::from_value(item.clone()).map_err(|e| GatewayError::InvalidMessages {
                    reason: format!("message {index}: {e}"),
                })?;
            if message.role.trim().is_empty() {
                return Err(GatewayError::InvalidMessages {
                    reason: format!("message {index}: role is empty"),
                });
            }
            Ok(message)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Sampling
// ---------------------------------------------------------------------------

/// Sampling temperature in the range `[0.0, 2.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Temperature(f64);

impl Temperature {
    /// Creates a [`Temperature`], returning `None` if `value` is outside
    /// `[0.0, 2.0]` or not finite.
    #[must_use]
    pub fn new(value: f64) -> Option<Self> {
        if value.is_finite() && (0.0..=2.0).contains(&value) {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Returns the temperature as an `f64`.
    pub fn as_f64(self) -> f64 {
        self.0
    }
}

impl Default for Temperature {
    fn default() -> Self {
        Self(1.0)
    }
}

impl std::fmt::Display for Temperature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

// ---------------------------------------------------------------------------

/// Requested shape of the completion text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Free-form text (provider default; nothing is sent).
    #[default]
    Text,
    /// A JSON object (`response_format: {"type": "json_object"}`).
    Json,
}

// ---------------------------------------------------------------------------

/// Numeric and transport options shared by every provider.
///
/// `timeout` and `max_retries` are not interpreted by the builder; they are
/// copied onto the [`crate::OutboundRequest`] for the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOptions {
    /// Sampling temperature.
    pub temperature: Temperature,
    /// Maximum number of tokens to generate. Must be non-zero.
    pub max_tokens: u32,
    /// Nucleus sampling mass.
    pub top_p: Option<f64>,
    /// OpenAI-family frequency penalty.
    pub frequency_penalty: Option<f64>,
    /// OpenAI-family presence penalty.
    pub presence_penalty: Option<f64>,
    /// Per-attempt timeout; `None` leaves the transport default in place.
    pub timeout: Option<Duration>,
    /// Extra attempts after the first on retryable failures.
    pub max_retries: u32,
    /// Requested completion format.
    pub response_format: ResponseFormat,
}

impl RequestOptions {
    /// Default token limit.
    pub const DEFAULT_MAX_TOKENS: u32 = 100;
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            temperature: Temperature::default(),
            max_tokens: Self::DEFAULT_MAX_TOKENS,
            top_p: None,
            frequency_penalty: None,
            presence_penalty: None,
            timeout: None,
            max_retries: 0,
            response_format: ResponseFormat::Text,
        }
    }
}

// ---------------------------------------------------------------------------
// Caching
// ---------------------------------------------------------------------------

/// Gateway cache lifetime, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CacheTtl(u64);

impl CacheTtl {
    /// Seven days.
    pub const DEFAULT_SECS: u64 = 604_800;
    /// 365 days; the gateway's documented upper bound.
    pub const MAX_SECS: u64 = 31_536_000;

    /// Creates a TTL. Zero means "unspecified" and yields the default.
    pub fn from_secs(secs: u64) -> Self {
        if secs == 0 {
            Self::default()
        } else {
            Self(secs)
        }
    }

    /// Returns the TTL in seconds.
    pub fn as_secs(self) -> u64 {
        self.0
    }

    /// Returns `true` if the TTL is above [`CacheTtl::MAX_SECS`].
    pub fn exceeds_gateway_max(self) -> bool {
        self.0 > Self::MAX_SECS
    }
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self(Self::DEFAULT_SECS)
    }
}

impl std::fmt::Display for CacheTtl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
