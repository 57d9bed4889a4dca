//! The node's parameter schema and its conversion into a [`ChatRequest`].
//!
//! Field names and defaults mirror what a workflow editor presents. Every
//! field is optional on input; missing fields take the defaults below. The
//! conversion in [`NodeParameters::to_chat_request`] is where "missing required
//! field" configuration errors are raised.

use std::time::Duration;

use gateway::{
    parse_messages, AnthropicConfig, ApiKey, AzureConfig, CacheTtl, ChatRequest, DeploymentName,
    GatewayError, ModelName, ObservabilityOptions, OpenAiConfig, ProviderConfig, ProviderKind,
    RequestOptions, ResponseFormat, SessionId, SessionName, SessionPath, Temperature,
    DEFAULT_ANTHROPIC_MODEL, DEFAULT_AZURE_API_VERSION, DEFAULT_OPENAI_MODEL,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_MESSAGES: &str = r#"[{"role": "user", "content": "Hello!"}]"#;

// ---------------------------------------------------------------------------
// Provider sections
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiParameters {
    pub api_key: String,
    pub model: String,
}

impl Default for OpenAiParameters {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnthropicParameters {
    pub api_key: String,
    pub model: String,
    pub system_message: String,
}

impl Default for AnthropicParameters {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_ANTHROPIC_MODEL.to_string(),
            system_message: String::new(),
        }
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureParameters {
    pub api_key: String,
    /// Resource host without scheme, e.g. `myresource.openai.azure.com`.
    pub domain: String,
    pub deployment_name: String,
    pub api_version: String,
}

impl Default for AzureParameters {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            domain: String::new(),
            deployment_name: String::new(),
            api_version: DEFAULT_AZURE_API_VERSION.to_string(),
        }
    }
}

// API keys stay out of Debug output.
impl std::fmt::Debug for OpenAiParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiParameters")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for AnthropicParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicParameters")
            .field("model", &self.model)
            .field("system_message", &self.system_message)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for AzureParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureParameters")
            .field("domain", &self.domain)
            .field("deployment_name", &self.deployment_name)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Observability section
// ---------------------------------------------------------------------------

/// Gateway features grouped under "Additional Options".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdditionalOptions {
    /// JSON object, or a string containing one. Malformed input is ignored.
    pub custom_properties: Option<Value>,
    pub session_id: String,
    pub session_path: String,
    pub session_name: String,
    pub enable_caching: bool,
    /// Seconds; zero means the default of seven days.
    pub cache_ttl: u64,
}

impl Default for AdditionalOptions {
    fn default() -> Self {
        Self {
            custom_properties: None,
            session_id: String::new(),
            session_path: String::new(),
            session_name: String::new(),
            enable_caching: false,
            cache_ttl: CacheTtl::DEFAULT_SECS,
        }
    }
}

impl AdditionalOptions {
    fn to_observability(&self) -> ObservabilityOptions {
        ObservabilityOptions {
            custom_properties: self.custom_properties.clone(),
            session_id: SessionId::new(self.session_id.as_str()),
            session_path: SessionPath::new(self.session_path.as_str()),
            session_name: SessionName::new(self.session_name.as_str()),
            cache: self
                .enable_caching
                .then(|| CacheTtl::from_secs(self.cache_ttl)),
        }
    }
}

// ---------------------------------------------------------------------------
// Node parameters
// ---------------------------------------------------------------------------

/// All parameters of one node invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeParameters {
    pub provider: ProviderKind,
    pub openai: OpenAiParameters,
    pub anthropic: AnthropicParameters,
    pub azure: AzureParameters,
    /// JSON array of `{role, content}`, or a string containing one.
    pub messages: Value,
    pub max_tokens: u32,
    pub temperature: f64,
    pub top_p: Option<f64>,
    pub frequency_penalty: Option<f64>,
    pub presence_penalty: Option<f64>,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    pub max_retries: u32,
    pub response_format: ResponseFormat,
    pub additional_options: AdditionalOptions,
}

impl Default for NodeParameters {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            openai: OpenAiParameters::default(),
            anthropic: AnthropicParameters::default(),
            azure: AzureParameters::default(),
            messages: Value::String(DEFAULT_MESSAGES.to_string()),
            max_tokens: RequestOptions::DEFAULT_MAX_TOKENS,
            temperature: 1.0,
            top_p: None,
            frequency_penalty: None,
            presence_penalty: None,
            timeout_ms: None,
            max_retries: 0,
            response_format: ResponseFormat::Text,
            additional_options: AdditionalOptions::default(),
        }
    }
}

impl NodeParameters {
    /// Returns these parameters with `overrides` deep-merged on top.
    ///
    /// Objects merge key by key; any other value replaces the base value.
    pub fn overlay(&self, overrides: &Value) -> Result<Self, serde_json::Error> {
        let mut merged = serde_json::to_value(self)?;
        merge(&mut merged, overrides);
        serde_json::from_value(merged)
    }

    /// Validates the parameters and converts them into a [`ChatRequest`].
    ///
    /// # Errors
    ///
    /// [`GatewayError::Configuration`] when a required field for the selected
    /// provider is empty or a numeric field is out of range;
    /// [`GatewayError::InvalidMessages`] when `messages` cannot be parsed.
    pub fn to_chat_request(&self) -> Result<ChatRequest, GatewayError> {
        let provider = self.provider_config()?;
        let messages = parse_messages(&self.messages)?;
        let temperature = Temperature::new(self.temperature).ok_or_else(|| {
            GatewayError::configuration(format!(
                "temperature must be within 0..=2, got {}",
                self.temperature
            ))
        })?;

        Ok(ChatRequest {
            provider,
            messages,
            options: RequestOptions {
                temperature,
                max_tokens: self.max_tokens,
                top_p: self.top_p,
                frequency_penalty: self.frequency_penalty,
                presence_penalty: self.presence_penalty,
                timeout: self.timeout_ms.map(Duration::from_millis),
                max_retries: self.max_retries,
                response_format: self.response_format,
            },
            observability: self.additional_options.to_observability(),
        })
    }

    fn provider_config(&self) -> Result<ProviderConfig, GatewayError> {
        match self.provider {
            ProviderKind::OpenAi => Ok(ProviderConfig::OpenAi(OpenAiConfig {
                api_key: required_key(&self.openai.api_key, "OpenAI API key")?,
                model: required_model(&self.openai.model)?,
            })),
            ProviderKind::Anthropic => Ok(ProviderConfig::Anthropic(AnthropicConfig {
                api_key: required_key(&self.anthropic.api_key, "Anthropic API key")?,
                model: required_model(&self.anthropic.model)?,
                system_message: Some(self.anthropic.system_message.clone())
                    .filter(|s| !s.trim().is_empty()),
            })),
            ProviderKind::Azure => {
                let deployment = DeploymentName::new(self.azure.deployment_name.as_str())
                    .ok_or_else(|| GatewayError::configuration("Azure deployment name is required"))?;
                Ok(ProviderConfig::Azure(AzureConfig::new(
                    required_key(&self.azure.api_key, "Azure API key")?,
                    self.azure.domain.as_str(),
                    deployment,
                    self.azure.api_version.as_str(),
                )?))
            }
        }
    }
}

fn required_key(value: &str, label: &str) -> Result<ApiKey, GatewayError> {
    ApiKey::new(value).ok_or_else(|| GatewayError::configuration(format!("{label} is required")))
}

fn required_model(value: &str) -> Result<ModelName, GatewayError> {
    ModelName::new(value).ok_or_else(|| GatewayError::configuration("model is required"))
}

fn merge(base: &mut Value, overrides: &Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                merge(base.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (base, overrides) => *base = overrides.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn openai_params() -> NodeParameters {
        NodeParameters {
            openai: OpenAiParameters {
                api_key: "sk-openai".into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn defaults_match_the_editor_defaults() {
        let params = NodeParameters::default();
        assert_eq!(params.provider, ProviderKind::OpenAi);
        assert_eq!(params.openai.model, "gpt-4o-mini");
        assert_eq!(params.anthropic.model, "claude-3-opus-20240229");
        assert_eq!(params.azure.api_version, "2023-12-01-preview");
        assert_eq!(params.max_tokens, 100);
        assert_eq!(params.temperature, 1.0);
        assert_eq!(params.additional_options.cache_ttl, 604_800);
    }

    #[test]
    fn missing_provider_key_is_a_configuration_error() {
        let err = NodeParameters::default().to_chat_request().unwrap_err();
        assert!(matches!(err, GatewayError::Configuration { .. }));
        assert!(err.to_string().contains("OpenAI API key"));

        let azure = NodeParameters {
            provider: ProviderKind::Azure,
            azure: AzureParameters {
                api_key: "k".into(),
                domain: "res.openai.azure.com".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(azure
            .to_chat_request()
            .unwrap_err()
            .to_string()
            .contains("deployment name"));
    }

    #[test]
    fn temperature_out_of_range_is_rejected() {
        let params = NodeParameters {
            temperature: 2.5,
            ..openai_params()
        };
        assert!(params.to_chat_request().is_err());
    }

    #[test]
    fn caching_is_only_enabled_by_the_flag() {
        let mut params = openai_params();
        params.additional_options.cache_ttl = 60;
        assert!(params.to_chat_request().unwrap().observability.cache.is_none());

        params.additional_options.enable_caching = true;
        assert_eq!(
            params.to_chat_request().unwrap().observability.cache,
            Some(CacheTtl::from_secs(60))
        );
    }

    #[test]
    fn blank_system_message_is_dropped() {
        let params = NodeParameters {
            provider: ProviderKind::Anthropic,
            anthropic: AnthropicParameters {
                api_key: "sk-ant".into(),
                system_message: "  ".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        match params.to_chat_request().unwrap().provider {
            ProviderConfig::Anthropic(config) => assert!(config.system_message.is_none()),
            other => panic!("unexpected provider {other:?}"),
        }
    }

    #[test]
    fn overlay_merges_nested_sections() {
        let params = openai_params()
            .overlay(&json!({
                "max_tokens": 256,
                "additional_options": {"session_id": "item-7"}
            }))
            .unwrap();
        assert_eq!(params.max_tokens, 256);
        assert_eq!(params.openai.api_key, "sk-openai");
        assert_eq!(params.additional_options.session_id, "item-7");
        assert_eq!(params.additional_options.cache_ttl, 604_800);
    }

    #[test]
    fn debug_output_hides_api_keys() {
        let rendered = format!("{:?}", openai_params());
        assert!(!rendered.contains("sk-openai"));
    }

    #[test]
    fn parameters_deserialize_with_defaults_for_missing_fields() {
        let params: NodeParameters = serde_json::from_value(json!({
            "provider": "anthropic",
            "anthropic": {"api_key": "sk-ant"}
        }))
        .unwrap();
        assert_eq!(params.provider, ProviderKind::Anthropic);
        assert_eq!(params.anthropic.model, DEFAULT_ANTHROPIC_MODEL);
        assert_eq!(params.messages, json!(DEFAULT_MESSAGES));
    }
}
