//! Newtype identifiers and secrets.
//!
//! Every string that has meaning to the gateway or a provider is represented
//! as a distinct newtype. This prevents accidentally interchanging (for
//! example) a [`SessionId`] with a [`SessionName`] even though both are
//! `String` under the hood. Constructors reject empty values, so holding one
//! of these types means the field is present.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// `keep_blank` types reject only the empty string; the rest also reject
// whitespace-only values.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (@impl $(#[$attr:meta])* $name:ident, $is_absent:expr) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value counts
            /// as absent.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                let is_absent: fn(&str) -> bool = $is_absent;
                if is_absent(&v) { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
    ($(#[$attr:meta])* $name:ident, keep_blank) => {
        string_id!(@impl $(#[$attr])* $name, |v| v.is_empty());
    };
    ($(#[$attr:meta])* $name:ident) => {
        string_id!(@impl $(#[$attr])* $name, |v| v.trim().is_empty());
    };
}

string_id! {
    /// Provider model identifier, e.g. `gpt-4o-mini` or `claude-3-opus-20240229`.
    ModelName
}

string_id! {
    /// Caller-supplied session identifier (`Helicone-Session-Id`).
    SessionId, keep_blank
}

string_id! {
    /// Hierarchical session path, e.g. `/parent/child` (`Helicone-Session-Path`).
    SessionPath, keep_blank
}

string_id! {
    /// Human-readable session name (`Helicone-Session-Name`).
    SessionName, keep_blank
}

string_id! {
    /// Azure OpenAI deployment name; forms part of the endpoint path.
    DeploymentName
}

// ---------------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------------

/// An API key for the gateway or a provider.
///
/// `Debug` and `Display` never print the key itself.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps a key, returning `None` if it is empty or only whitespace.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        if v.trim().is_empty() {
            None
        } else {
            Some(Self(v))
        }
    }

    /// Returns the raw key for placing in a header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl std::fmt::Display for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("***")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_identifiers_are_rejected() {
        assert!(SessionId::new("").is_none());
        assert!(ModelName::new("   ").is_none());
        assert!(DeploymentName::new("\t").is_none());
        assert_eq!(SessionPath::new("/a/b").unwrap().as_str(), "/a/b");
    }

    #[test]
    fn whitespace_session_values_are_kept_verbatim() {
        assert_eq!(SessionName::new("   ").unwrap().as_str(), "   ");
        assert_eq!(SessionId::new(" s ").unwrap().as_str(), " s ");
        assert!(SessionPath::new("").is_none());
    }

    #[test]
    fn api_key_is_redacted_in_debug_output() {
        let key = ApiKey::new("sk-secret").unwrap();
        assert_eq!(format!("{key:?}"), "ApiKey(***)");
        assert_eq!(key.to_string(), "***");
        assert_eq!(key.expose(), "sk-secret");
    }
}
