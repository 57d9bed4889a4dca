//! Helicone gateway HTTP transport.
//!
//! Implements the [`gateway::ChatTransport`] trait over `reqwest`. The request
//! builder in the [`gateway`] crate decides *what* is sent; this crate decides
//! *how*: header encoding, per-attempt timeouts, `Retry-After` handling and
//! exponential back-off.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** All HTTP transport and retry scheduling lives here. The
//! [`gateway`] and `nodes` crates see only [`gateway::ChatTransport`].

pub mod retry;
pub mod transport;

pub use retry::{parse_retry_after, Backoff};
pub use transport::{HttpTransport, HttpTransportConfig, LlmError};
