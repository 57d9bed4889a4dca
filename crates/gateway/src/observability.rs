//! Gateway observability options: custom properties, sessions and caching.
//!
//! These only ever produce headers. Nothing here affects the request body,
//! and caching is a hint to the remote gateway rather than local state.

use std::collections::{BTreeMap, HashSet};

use serde_json::Value;
use tracing::warn;

use crate::headers;
use crate::{CacheTtl, SessionId, SessionName, SessionPath};

/// Optional tracking and caching settings for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservabilityOptions {
    /// Custom properties: a JSON object, or a string holding JSON object text.
    ///
    /// Parsed leniently; see [`custom_property_headers`].
    pub custom_properties: Option<Value>,
    pub session_id: Option<SessionId>,
    pub session_path: Option<SessionPath>,
    pub session_name: Option<SessionName>,
    /// `Some` enables gateway caching with the given lifetime.
    pub cache: Option<CacheTtl>,
}

impl ObservabilityOptions {
    /// Inserts every observability header into `headers`.
    pub fn apply(&self, headers: &mut BTreeMap<String, String>) {
        if let Some(raw) = &self.custom_properties {
            headers.extend(custom_property_headers(raw));
        }

        let sessions = [
            (headers::HELICONE_SESSION_ID, self.session_id.as_ref().map(SessionId::as_str)),
            (headers::HELICONE_SESSION_PATH, self.session_path.as_ref().map(SessionPath::as_str)),
            (headers::HELICONE_SESSION_NAME, self.session_name.as_ref().map(SessionName::as_str)),
        ];
        for (name, value) in sessions {
            if let Some(value) = value {
                headers.insert(name.to_string(), value.to_string());
            }
        }

        if let Some(ttl) = self.cache {
            if ttl.exceeds_gateway_max() {
                warn!(
                    ttl_secs = ttl.as_secs(),
                    max_secs = CacheTtl::MAX_SECS,
                    "Cache TTL exceeds the gateway maximum; sending it unchanged"
                );
            }
            headers.insert(headers::HELICONE_CACHE_ENABLED.to_string(), "true".to_string());
            headers.insert(headers::CACHE_CONTROL.to_string(), format!("max-age={ttl}"));
        }
    }
}

/// Turns custom properties into `Helicone-Property-<key>` headers.
///
/// String values are used verbatim; any other JSON value is rendered as its
/// JSON text. Input that is not a JSON object (or a string containing one) is
/// logged and yields no headers: properties are best-effort and never fail the
/// request. Blank text means "no properties". Keys that are not valid header
/// name tokens are skipped with a warning, as are keys that differ from an
/// earlier key only in letter case (header names are case-insensitive).
pub fn custom_property_headers(raw: &Value) -> Vec<(String, String)> {
    let parsed;
    let value = match raw {
        Value::String(text) if text.trim().is_empty() => return Vec::new(),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(v) => {
                parsed = v;
                &parsed
            }
            Err(e) => {
                warn!(error = %e, "Ignoring custom properties: not valid JSON");
                return Vec::new();
            }
        },
        Value::Null => return Vec::new(),
        other => other,
    };

    let Some(object) = value.as_object() else {
        warn!("Ignoring custom properties: expected a JSON object");
        return Vec::new();
    };

    let mut seen = HashSet::new();
    object
        .iter()
        .filter_map(|(key, value)| {
            if !is_header_token(key) {
                warn!(property = %key, "Skipping custom property with invalid header name");
                return None;
            }
            if !seen.insert(key.to_ascii_lowercase()) {
                warn!(
                    property = %key,
                    "Skipping custom property whose name differs from another only in case"
                );
                return None;
            }
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some((format!("{}{key}", headers::HELICONE_PROPERTY_PREFIX), value))
        })
        .collect()
}

// RFC 9110 token characters.
fn is_header_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn properties_are_prefixed_and_string_coerced() {
        let headers = custom_property_headers(&json!(
            r#"{"environment": "testing", "attempt": 3, "beta": true, "meta": {"a": 1}}"#
        ));
        assert_eq!(
            headers,
            vec![
                ("Helicone-Property-attempt".to_string(), "3".to_string()),
                ("Helicone-Property-beta".to_string(), "true".to_string()),
                ("Helicone-Property-environment".to_string(), "testing".to_string()),
                ("Helicone-Property-meta".to_string(), r#"{"a":1}"#.to_string()),
            ]
        );
    }

    #[test]
    fn malformed_or_non_object_properties_yield_nothing() {
        assert!(custom_property_headers(&json!("{not json")).is_empty());
        assert!(custom_property_headers(&json!("[1, 2]")).is_empty());
        assert!(custom_property_headers(&json!(["a"])).is_empty());
        assert!(custom_property_headers(&json!("")).is_empty());
        assert!(custom_property_headers(&Value::Null).is_empty());
    }

    #[test]
    fn invalid_header_names_are_skipped() {
        let headers = custom_property_headers(&json!({"ok": "1", "has space": "2", "": "3"}));
        assert_eq!(headers, vec![("Helicone-Property-ok".to_string(), "1".to_string())]);
    }

    #[test]
    fn keys_differing_only_in_case_yield_one_header() {
        let headers = custom_property_headers(&json!({"env": "a", "Env": "b", "region": "eu"}));
        let env: Vec<_> = headers
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case("Helicone-Property-env"))
            .collect();
        assert_eq!(env.len(), 1, "{headers:?}");
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn caching_adds_both_headers() {
        let options = ObservabilityOptions {
            cache: Some(CacheTtl::from_secs(3600)),
            ..Default::default()
        };
        let mut headers = BTreeMap::new();
        options.apply(&mut headers);
        assert_eq!(headers.get("Helicone-Cache-Enabled").map(String::as_str), Some("true"));
        assert_eq!(headers.get("Cache-Control").map(String::as_str), Some("max-age=3600"));
    }

    #[test]
    fn only_present_session_fields_become_headers() {
        let options = ObservabilityOptions {
            session_id: SessionId::new("s-1"),
            session_name: SessionName::new(""),
            ..Default::default()
        };
        let mut headers = BTreeMap::new();
        options.apply(&mut headers);
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("Helicone-Session-Id").map(String::as_str), Some("s-1"));
    }
}
