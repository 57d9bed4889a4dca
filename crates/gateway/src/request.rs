//! The request builder: node parameters in, HTTP request descriptor out.
//!
//! Building is a pure transform. Every call produces a fresh
//! [`OutboundRequest`]; the builder holds only the gateway credential.
//!
//! ## Header assembly order
//!
//! 1. `Content-Type` and `Helicone-Auth`.
//! 2. Observability headers (custom properties, sessions, caching).
//! 3. Provider auth headers. These are inserted last and win on collision.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::headers;
use crate::{
    ChatMessage, GatewayCredential, GatewayError, ObservabilityOptions, ProviderConfig,
    RequestOptions, ResponseFormat,
};

// ---------------------------------------------------------------------------
// Input and output
// ---------------------------------------------------------------------------

/// Everything needed to build one chat-completion request, apart from the
/// gateway credential.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub provider: ProviderConfig,
    pub messages: Vec<ChatMessage>,
    pub options: RequestOptions,
    pub observability: ObservabilityOptions,
}

/// A fully formed `POST` request, ready for a [`crate::ChatTransport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundRequest {
    /// Absolute target URL, including any query string.
    pub url: String,
    /// Header map. Names are unique; values are already formatted.
    pub headers: BTreeMap<String, String>,
    /// JSON request body.
    pub body: Value,
    /// Per-attempt timeout for the transport.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
    /// Extra attempts after the first on retryable failures.
    pub max_retries: u32,
}

impl OutboundRequest {
    /// Returns the value of `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a copy with every credential header value replaced by `***`.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        for (name, value) in copy.headers.iter_mut() {
            if headers::is_secret(name) {
                *value = "***".to_string();
            }
        }
        copy
    }
}

// ---------------------------------------------------------------------------
// Provider body shapes
// ---------------------------------------------------------------------------

/// OpenAI chat completions body. Azure uses the same shape without `model`.
#[derive(Serialize)]
struct OpenAiBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormatBody>,
}

#[derive(Serialize)]
struct ResponseFormatBody {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct AnthropicBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
}

impl<'a> OpenAiBody<'a> {
    fn new(model: Option<&'a str>, messages: &'a [ChatMessage], options: &RequestOptions) -> Self {
        Self {
            model,
            messages,
            max_tokens: options.max_tokens,
            temperature: options.temperature.as_f64(),
            top_p: options.top_p,
            frequency_penalty: options.frequency_penalty,
            presence_penalty: options.presence_penalty,
            response_format: match options.response_format {
                ResponseFormat::Text => None,
                ResponseFormat::Json => Some(ResponseFormatBody { kind: "json_object" }),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builds [`OutboundRequest`]s that authenticate against the gateway with a
/// fixed credential.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    credential: GatewayCredential,
}

impl RequestBuilder {
    pub fn new(credential: GatewayCredential) -> Self {
        Self { credential }
    }

    /// Builds the request for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] or
    /// [`GatewayError::InvalidMessages`] for invalid parameters. Malformed
    /// custom properties never cause an error.
    #[instrument(skip_all, fields(provider = %request.provider.kind()))]
    pub fn build(&self, request: &ChatRequest) -> Result<OutboundRequest, GatewayError> {
        validate(request)?;

        let mut headers = BTreeMap::new();
        headers.insert(headers::CONTENT_TYPE.to_string(), "application/json".to_string());
        headers.insert(
            headers::HELICONE_AUTH.to_string(),
            format!("Bearer {}", self.credential.api_key().expose()),
        );

        request.observability.apply(&mut headers);

        let options = &request.options;
        let messages = request.messages.as_slice();
        let body = match &request.provider {
            ProviderConfig::OpenAi(openai) => {
                headers.insert(
                    headers::AUTHORIZATION.to_string(),
                    format!("Bearer {}", openai.api_key.expose()),
                );
                serde_json::to_value(OpenAiBody::new(
                    Some(openai.model.as_str()),
                    messages,
                    options,
                ))?
            }
            ProviderConfig::Anthropic(anthropic) => {
                headers.insert(
                    headers::ANTHROPIC_API_KEY.to_string(),
                    anthropic.api_key.expose().to_string(),
                );
                headers.insert(
                    headers::ANTHROPIC_VERSION.to_string(),
                    headers::ANTHROPIC_VERSION_VALUE.to_string(),
                );
                if options.frequency_penalty.is_some()
                    || options.presence_penalty.is_some()
                    || options.response_format != ResponseFormat::Text
                {
                    debug!("Penalties and response format are not supported by Anthropic; omitted");
                }
                serde_json::to_value(AnthropicBody {
                    model: anthropic.model.as_str(),
                    messages,
                    max_tokens: options.max_tokens,
                    temperature: options.temperature.as_f64(),
                    top_p: options.top_p,
                    system: anthropic
                        .system_message
                        .as_deref()
                        .filter(|s| !s.trim().is_empty()),
                })?
            }
            ProviderConfig::Azure(azure) => {
                headers.insert(
                    headers::AZURE_API_KEY.to_string(),
                    azure.api_key().expose().to_string(),
                );
                headers.insert(
                    headers::HELICONE_OPENAI_API_BASE.to_string(),
                    format!("https://{}", azure.domain()),
                );
                serde_json::to_value(OpenAiBody::new(None, messages, options))?
            }
        };

        let url = request.provider.endpoint(self.credential.base_url());
        debug!(url = %url, header_count = headers.len(), "Built gateway request");

        Ok(OutboundRequest {
            url,
            headers,
            body,
            timeout: options.timeout,
            max_retries: options.max_retries,
        })
    }
}

fn validate(request: &ChatRequest) -> Result<(), GatewayError> {
    if request.messages.is_empty() {
        return Err(GatewayError::InvalidMessages {
            reason: "at least one message is required".to_string(),
        });
    }
    let options = &request.options;
    if options.max_tokens == 0 {
        return Err(GatewayError::configuration("max tokens must be greater than zero"));
    }
    if let Some(top_p) = options.top_p {
        if !(top_p.is_finite() && (0.0..=1.0).contains(&top_p)) {
            return Err(GatewayError::configuration(format!(
                "top-p must be within 0..=1, got {top_p}"
            )));
        }
    }
    for (name, penalty) in [
        ("frequency penalty", options.frequency_penalty),
        ("presence penalty", options.presence_penalty),
    ] {
        if let Some(p) = penalty {
            if !(p.is_finite() && (-2.0..=2.0).contains(&p)) {
                return Err(GatewayError::configuration(format!(
                    "{name} must be within -2..=2, got {p}"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{ApiKey, ModelName, OpenAiConfig};

    fn builder() -> RequestBuilder {
        RequestBuilder::new(GatewayCredential::new(ApiKey::new("pk-helicone").unwrap()))
    }

    fn openai_request() -> ChatRequest {
        ChatRequest {
            provider: ProviderConfig::OpenAi(OpenAiConfig {
                api_key: ApiKey::new("sk-openai").unwrap(),
                model: ModelName::new("gpt-4o-mini").unwrap(),
            }),
            messages: vec![ChatMessage::text("user", "Hello!")],
            options: RequestOptions::default(),
            observability: ObservabilityOptions::default(),
        }
    }

    #[test]
    fn redaction_hides_every_credential() {
        let built = builder().build(&openai_request()).unwrap().redacted();
        assert_eq!(built.header("helicone-auth"), Some("***"));
        assert_eq!(built.header("authorization"), Some("***"));
        assert_eq!(built.header("content-type"), Some("application/json"));
    }

    #[test]
    fn optional_sampling_fields_are_omitted_unless_set() {
        let built = builder().build(&openai_request()).unwrap();
        assert_eq!(
            built.body,
            json!({
                "model": "gpt-4o-mini",
                "messages": [{"role": "user", "content": "Hello!"}],
                "max_tokens": 100,
                "temperature": 1.0,
            })
        );
    }

    #[test]
    fn json_response_format_maps_to_json_object() {
        let mut request = openai_request();
        request.options.response_format = ResponseFormat::Json;
        request.options.top_p = Some(0.9);
        let built = builder().build(&request).unwrap();
        assert_eq!(built.body["response_format"], json!({"type": "json_object"}));
        assert_eq!(built.body["top_p"], json!(0.9));
    }

    #[test]
    fn out_of_range_options_are_configuration_errors() {
        let mut request = openai_request();
        request.options.max_tokens = 0;
        assert!(matches!(
            builder().build(&request),
            Err(GatewayError::Configuration { .. })
        ));

        let mut request = openai_request();
        request.options.top_p = Some(1.5);
        assert!(builder().build(&request).is_err());

        let mut request = openai_request();
        request.options.presence_penalty = Some(-3.0);
        assert!(builder().build(&request).is_err());
    }

    #[test]
    fn transport_settings_pass_through() {
        let mut request = openai_request();
        request.options.timeout = Some(Duration::from_secs(12));
        request.options.max_retries = 3;
        let built = builder().build(&request).unwrap();
        assert_eq!(built.timeout, Some(Duration::from_secs(12)));
        assert_eq!(built.max_retries, 3);
    }
}
