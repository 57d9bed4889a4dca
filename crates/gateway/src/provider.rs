//! Provider selection and gateway endpoints.
//!
//! Each [`ProviderConfig`] variant owns the credentials its upstream needs and
//! knows which gateway endpoint serves it. The gateway credential itself is a
//! separate [`GatewayCredential`] because it is shared by every provider.

use serde::{Deserialize, Serialize};

use crate::{ApiKey, DeploymentName, GatewayError, ModelName};

/// Gateway host that proxies OpenAI and Azure OpenAI.
pub const OPENAI_GATEWAY_BASE: &str = "https://oai.helicone.ai";
/// Gateway host that proxies Anthropic.
pub const ANTHROPIC_GATEWAY_BASE: &str = "https://anthropic.helicone.ai";

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-opus-20240229";
pub const DEFAULT_AZURE_API_VERSION: &str = "2023-12-01-preview";

// ---------------------------------------------------------------------------
// Gateway credential
// ---------------------------------------------------------------------------

/// The Helicone API key plus an optional base-URL override.
///
/// When `base_url` is set it replaces the scheme and host of every provider's
/// gateway endpoint (for self-hosted gateways); paths are unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCredential {
    api_key: ApiKey,
    base_url: Option<String>,
}

impl GatewayCredential {
    /// Creates a credential that targets the hosted gateway.
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            base_url: None,
        }
    }

    /// Sets the base-URL override.
    ///
    /// The URL must start with `http://` or `https://`; a trailing `/` is
    /// dropped.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Result<Self, GatewayError> {
        let url = base_url.into();
        let url = url.trim().trim_end_matches('/');
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(GatewayError::configuration(format!(
                "gateway base URL must start with http:// or https://, got '{url}'"
            )));
        }
        self.base_url = Some(url.to_string());
        Ok(self)
    }

    /// The Helicone API key.
    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// The base-URL override, if any.
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Provider selection
// ---------------------------------------------------------------------------

/// Which upstream provider serves the completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ProviderKind {
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "azure")]
    Azure,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::OpenAi => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Azure => "Azure OpenAI",
        };
        f.write_str(name)
    }
}

/// OpenAI chat completions.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenAiConfig {
    pub api_key: ApiKey,
    pub model: ModelName,
}

/// Anthropic messages API.
#[derive(Debug, Clone, PartialEq)]
pub struct AnthropicConfig {
    pub api_key: ApiKey,
    pub model: ModelName,
    /// Sent as the top-level `system` field when non-empty.
    pub system_message: Option<String>,
}

/// Azure OpenAI deployment.
#[derive(Debug, Clone, PartialEq)]
pub struct AzureConfig {
    api_key: ApiKey,
    domain: String,
    deployment: DeploymentName,
    api_version: String,
}

impl AzureConfig {
    /// Creates an Azure configuration.
    ///
    /// `domain` is the resource host, e.g. `myresource.openai.azure.com`. A
    /// leading `https://` is tolerated and stripped, as is a trailing `/`.
    pub fn new(
        api_key: ApiKey,
        domain: impl Into<String>,
        deployment: DeploymentName,
        api_version: impl Into<String>,
    ) -> Result<Self, GatewayError> {
        let domain = domain.into();
        let domain = domain
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/')
            .to_string();
        if domain.is_empty() {
            return Err(GatewayError::configuration("Azure domain is required"));
        }
        let api_version = api_version.into().trim().to_string();
        if api_version.is_empty() {
            return Err(GatewayError::configuration("Azure API version is required"));
        }
        if !is_url_segment(deployment.as_str()) {
            return Err(GatewayError::configuration(format!(
                "Azure deployment name '{deployment}' contains characters not allowed in a URL path segment"
            )));
        }
        if !is_url_segment(&api_version) {
            return Err(GatewayError::configuration(format!(
                "Azure API version '{api_version}' contains characters not allowed in a URL query value"
            )));
        }
        Ok(Self {
            api_key,
            domain,
            deployment,
            api_version,
        })
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    /// Resource host without scheme.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn deployment(&self) -> &DeploymentName {
        &self.deployment
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }
}

// Deployment names and API versions are interpolated into the endpoint URL
// unencoded, so they are limited to RFC 3986 unreserved characters.
fn is_url_segment(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"-._~".contains(&b))
}

/// A provider together with its credentials.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderConfig {
    OpenAi(OpenAiConfig),
    Anthropic(AnthropicConfig),
    Azure(AzureConfig),
}

impl ProviderConfig {
    /// The provider selector for this configuration.
    pub fn kind(&self) -> ProviderKind {
        match self {
            Self::OpenAi(_) => ProviderKind::OpenAi,
            Self::Anthropic(_) => ProviderKind::Anthropic,
            Self::Azure(_) => ProviderKind::Azure,
        }
    }

    /// Full endpoint URL, honouring the gateway base-URL override.
    pub fn endpoint(&self, base_override: Option<&str>) -> String {
        match self {
            Self::OpenAi(_) => format!(
                "{}/v1/chat/completions",
                base_override.unwrap_or(OPENAI_GATEWAY_BASE)
            ),
            Self::Anthropic(_) => format!(
                "{}/v1/messages",
                base_override.unwrap_or(ANTHROPIC_GATEWAY_BASE)
            ),
            Self::Azure(azure) => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                base_override.unwrap_or(OPENAI_GATEWAY_BASE),
                azure.deployment(),
                azure.api_version()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ApiKey {
        ApiKey::new("k").unwrap()
    }

    fn azure() -> AzureConfig {
        AzureConfig::new(
            key(),
            "https://myresource.openai.azure.com/",
            DeploymentName::new("gpt4o").unwrap(),
            DEFAULT_AZURE_API_VERSION,
        )
        .unwrap()
    }

    #[test]
    fn endpoints_match_the_hosted_gateway() {
        let openai = ProviderConfig::OpenAi(OpenAiConfig {
            api_key: key(),
            model: ModelName::new(DEFAULT_OPENAI_MODEL).unwrap(),
        });
        let anthropic = ProviderConfig::Anthropic(AnthropicConfig {
            api_key: key(),
            model: ModelName::new(DEFAULT_ANTHROPIC_MODEL).unwrap(),
            system_message: None,
        });
        assert_eq!(
            openai.endpoint(None),
            "https://oai.helicone.ai/v1/chat/completions"
        );
        assert_eq!(
            anthropic.endpoint(None),
            "https://anthropic.helicone.ai/v1/messages"
        );
        assert_eq!(
            ProviderConfig::Azure(azure()).endpoint(None),
            "https://oai.helicone.ai/openai/deployments/gpt4o/chat/completions?api-version=2023-12-01-preview"
        );
    }

    #[test]
    fn base_override_replaces_the_host_only() {
        let cred = GatewayCredential::new(key())
            .with_base_url("http://localhost:8787/")
            .unwrap();
        let config = ProviderConfig::Azure(azure());
        assert_eq!(
            config.endpoint(cred.base_url()),
            "http://localhost:8787/openai/deployments/gpt4o/chat/completions?api-version=2023-12-01-preview"
        );
    }

    #[test]
    fn base_override_requires_a_scheme() {
        let err = GatewayCredential::new(key())
            .with_base_url("localhost:8787")
            .unwrap_err();
        assert!(matches!(err, GatewayError::Configuration { .. }));
    }

    #[test]
    fn azure_domain_is_normalised_and_required() {
        assert_eq!(azure().domain(), "myresource.openai.azure.com");
        let err = AzureConfig::new(
            key(),
            "  ",
            DeploymentName::new("d").unwrap(),
            DEFAULT_AZURE_API_VERSION,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Azure domain"));
    }

    #[test]
    fn azure_deployment_cannot_alter_the_endpoint_url() {
        for deployment in ["gpt4o/../admin", "gpt4o?x=1", "gpt4o#frag", "my deployment"] {
            let err = AzureConfig::new(
                key(),
                "myresource.openai.azure.com",
                DeploymentName::new(deployment).unwrap(),
                DEFAULT_AZURE_API_VERSION,
            )
            .unwrap_err();
            assert!(err.to_string().contains("Azure deployment name"), "{deployment}");
        }

        let err = AzureConfig::new(
            key(),
            "myresource.openai.azure.com",
            DeploymentName::new("gpt4o").unwrap(),
            "2024-02-01&x=1",
        )
        .unwrap_err();
        assert!(err.to_string().contains("Azure API version"));
    }

    #[test]
    fn azure_endpoint_uses_deployment_and_version() {
        assert_eq!(
            ProviderConfig::Azure(azure()).endpoint(None),
            format!(
                "https://oai.helicone.ai/openai/deployments/gpt4o/chat/completions?api-version={DEFAULT_AZURE_API_VERSION}"
            )
        );
    }

    #[test]
    fn provider_kind_uses_lowercase_selectors() {
        let kind: ProviderKind = serde_json::from_str("\"azure\"").unwrap();
        assert_eq!(kind, ProviderKind::Azure);
        assert_eq!(ProviderKind::default(), ProviderKind::OpenAi);
    }
}
