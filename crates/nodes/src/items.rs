//! Batch input and output items.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One input item.
///
/// If `json` contains a `parameters` object, it is deep-merged over the node's
/// base parameters for this item only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeItem {
    #[serde(default)]
    pub json: Value,
}

impl NodeItem {
    pub fn new(json: Value) -> Self {
        Self { json }
    }

    /// An item with no data, used when a run has no input.
    pub fn empty() -> Self {
        Self {
            json: Value::Object(Map::new()),
        }
    }

    /// Per-item parameter overrides, if present.
    pub fn parameter_overrides(&self) -> Option<&Value> {
        self.json.get("parameters").filter(|v| v.is_object())
    }
}

/// Index of the input item an output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairedItem {
    pub item: usize,
}

/// One output item: the gateway response, or an error record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeOutput {
    pub json: Value,
    pub paired_item: PairedItem,
}

impl NodeOutput {
    pub fn success(item: usize, response: Value) -> Self {
        Self {
            json: response,
            paired_item: PairedItem { item },
        }
    }

    /// `{"error": message}` paired with `item`.
    pub fn error(item: usize, message: impl Into<String>) -> Self {
        Self {
            json: serde_json::json!({ "error": message.into() }),
            paired_item: PairedItem { item },
        }
    }

    /// Returns `true` if this output is an error record.
    pub fn is_error(&self) -> bool {
        self.json
            .as_object()
            .is_some_and(|o| o.len() == 1 && o.contains_key("error"))
    }
}
