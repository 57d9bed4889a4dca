//! Header names understood by the gateway and the upstream providers.

/// Gateway credential: `Bearer <helicone key>`.
pub const HELICONE_AUTH: &str = "Helicone-Auth";
/// Prefix for one header per custom tracking property.
pub const HELICONE_PROPERTY_PREFIX: &str = "Helicone-Property-";
pub const HELICONE_SESSION_ID: &str = "Helicone-Session-Id";
pub const HELICONE_SESSION_PATH: &str = "Helicone-Session-Path";
pub const HELICONE_SESSION_NAME: &str = "Helicone-Session-Name";
pub const HELICONE_CACHE_ENABLED: &str = "Helicone-Cache-Enabled";
/// Upstream base URL the gateway forwards Azure requests to.
pub const HELICONE_OPENAI_API_BASE: &str = "Helicone-OpenAI-Api-Base";

pub const CACHE_CONTROL: &str = "Cache-Control";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const AUTHORIZATION: &str = "Authorization";

pub const ANTHROPIC_API_KEY: &str = "x-api-key";
pub const ANTHROPIC_VERSION: &str = "anthropic-version";
/// Anthropic messages API version pinned for every request.
pub const ANTHROPIC_VERSION_VALUE: &str = "2023-06-01";

pub const AZURE_API_KEY: &str = "api-key";

/// Headers whose values are credentials and must never be logged or printed.
pub const SECRET_HEADERS: [&str; 4] = [HELICONE_AUTH, AUTHORIZATION, ANTHROPIC_API_KEY, AZURE_API_KEY];

/// Returns `true` if `name` carries a credential (case-insensitive).
pub fn is_secret(name: &str) -> bool {
    SECRET_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(name))
}
