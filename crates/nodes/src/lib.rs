//! The Helicone workflow node.
//!
//! This crate provides [`HeliconeNode`], which takes a batch of input items,
//! resolves the node's [`NodeParameters`] for each one, builds the gateway
//! request with the [`gateway`] crate's request builder and hands it to a
//! [`gateway::ChatTransport`].
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The node sequences parameter resolution, request
//! building and dispatch, and applies the continue-on-failure policy. It
//! contains no request-shaping rules of its own.

pub mod errors;
pub mod items;
pub mod node;
pub mod parameters;

pub use errors::{ItemError, NodeError};
pub use items::{NodeItem, NodeOutput, PairedItem};
pub use node::HeliconeNode;
pub use parameters::{
    AdditionalOptions, AnthropicParameters, AzureParameters, NodeParameters, OpenAiParameters,
};
