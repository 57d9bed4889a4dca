//! Layered CLI configuration.
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults.
//! 2. A config file: the `--config` path, or `./helicone.{toml,yaml,json}` if present.
//! 3. Environment variables prefixed `HELICONE__`, with `__` separating
//!    nested keys (e.g. `HELICONE__NODE__MAX_TOKENS=256`).
//! 4. Well-known credential variables (`HELICONE_API_KEY`, `OPENAI_API_KEY`,
//!    `ANTHROPIC_API_KEY`, `AZURE_OPENAI_API_KEY`), applied only to fields
//!    that are still empty.
//!
//! A `.env` file in the working directory is loaded first.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use gateway::{ApiKey, GatewayCredential};
use llm::{Backoff, HttpTransportConfig};
use nodes::NodeParameters;
use serde::Deserialize;

/// Gateway credential section.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct HeliconeSection {
    pub api_key: String,
    /// Self-hosted gateway base URL.
    pub base_url: Option<String>,
}

impl std::fmt::Debug for HeliconeSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeliconeSection")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransportSection {
    pub default_timeout_ms: u64,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for TransportSection {
    fn default() -> Self {
        Self {
            default_timeout_ms: 60_000,
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub format: LogFormat,
    /// `EnvFilter` directive; `RUST_LOG` takes precedence when set.
    pub filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            filter: "info".to_string(),
        }
    }
}

/// Complete CLI configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub helicone: HeliconeSection,
    pub node: NodeParameters,
    pub continue_on_fail: bool,
    pub transport: TransportSection,
    pub logging: LoggingSection,
}

impl AppConfig {
    /// Loads configuration from all sources.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let file = match path {
            Some(path) => ::config::File::from(path).required(true),
            None => ::config::File::with_name("helicone").required(false),
        };
        let mut config: Self = ::config::Config::builder()
            .add_source(file)
            .add_source(
                ::config::Environment::with_prefix("HELICONE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        config.apply_env_fallbacks(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Fills empty credential fields from well-known variables via `lookup`.
    pub fn apply_env_fallbacks(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let fields = [
            (&mut self.helicone.api_key, "HELICONE_API_KEY"),
            (&mut self.node.openai.api_key, "OPENAI_API_KEY"),
            (&mut self.node.anthropic.api_key, "ANTHROPIC_API_KEY"),
            (&mut self.node.azure.api_key, "AZURE_OPENAI_API_KEY"),
        ];
        for (field, name) in fields {
            if field.trim().is_empty() {
                if let Some(value) = lookup(name) {
                    *field = value;
                }
            }
        }
    }

    /// The gateway credential; fails if no Helicone key is configured.
    pub fn credential(&self) -> anyhow::Result<GatewayCredential> {
        let key = ApiKey::new(self.helicone.api_key.as_str()).context(
            "Helicone API key is required (set helicone.api_key or HELICONE_API_KEY)",
        )?;
        let credential = GatewayCredential::new(key);
        match self.helicone.base_url.as_deref().filter(|u| !u.trim().is_empty()) {
            Some(url) => Ok(credential.with_base_url(url)?),
            None => Ok(credential),
        }
    }

    pub fn transport_config(&self) -> HttpTransportConfig {
        let t = &self.transport;
        HttpTransportConfig {
            default_timeout: (t.default_timeout_ms > 0)
                .then(|| Duration::from_millis(t.default_timeout_ms)),
            backoff: Backoff::new(
                Duration::from_millis(t.initial_backoff_ms),
                Duration::from_millis(t.max_backoff_ms),
            ),
            ..HttpTransportConfig::default()
        }
    }
}
