//! Core domain for the Helicone gateway node.
//!
//! This crate contains every type needed to describe a chat-completion request
//! routed through the Helicone observability gateway, and the request builder
//! that turns those types into an HTTP request descriptor. Infrastructure
//! crates implement the [`ChatTransport`] trait defined here; they never add
//! request-shaping rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is sent; the `llm` crate defines *how* it is sent.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`ModelName`, `SessionId`, etc.) and [`ApiKey`] |
//! | [`types`] | Value types (`ChatMessage`, `Temperature`, `RequestOptions`, `CacheTtl`) |
//! | [`provider`] | Provider configs, gateway endpoints, [`GatewayCredential`] |
//! | [`observability`] | Custom property, session and caching headers |
//! | [`request`] | [`RequestBuilder`] and [`OutboundRequest`] |
//! | [`transport`] | The [`ChatTransport`] port |
//! | [`headers`] | Header name constants |
//! | [`errors`] | Error and retry-policy types |

pub mod errors;
pub mod headers;
pub mod identifiers;
pub mod observability;
pub mod provider;
pub mod request;
pub mod transport;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{DispatchError, GatewayError, RetryPolicy};
pub use identifiers::{ApiKey, DeploymentName, ModelName, SessionId, SessionName, SessionPath};
pub use observability::{custom_property_headers, ObservabilityOptions};
pub use provider::{
    AnthropicConfig, AzureConfig, GatewayCredential, OpenAiConfig, ProviderConfig, ProviderKind,
    DEFAULT_ANTHROPIC_MODEL, DEFAULT_AZURE_API_VERSION, DEFAULT_OPENAI_MODEL,
};
pub use request::{ChatRequest, OutboundRequest, RequestBuilder};
pub use transport::ChatTransport;
pub use types::{
    parse_messages, CacheTtl, ChatMessage, RequestOptions, ResponseFormat, Temperature,
};
