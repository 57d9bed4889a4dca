//! Reading input items.
//!
//! Accepted forms:
//!
//! - a JSON array of items,
//! - JSON Lines, one item per non-blank line.
//!
//! Each element is either an item envelope `{"json": {...}}` or the item's
//! JSON data itself.

use anyhow::Context;
use nodes::NodeItem;
use serde_json::Value;

pub fn parse_items(text: &str) -> anyhow::Result<Vec<NodeItem>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(vec![NodeItem::empty()]);
    }

    let values: Vec<Value> = if trimmed.starts_with('[') {
        serde_json::from_str(trimmed).context("input is not a valid JSON array")?
    } else {
        trimmed
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line).with_context(|| format!("invalid JSON on line {}", n + 1))
            })
            .collect::<anyhow::Result<_>>()?
    };

    Ok(values.into_iter().map(into_item).collect())
}

fn into_item(value: Value) -> NodeItem {
    match value {
        Value::Object(mut map) if map.len() == 1 && map.contains_key("json") => {
            NodeItem::new(map.remove("json").unwrap_or(Value::Null))
        }
        other => NodeItem::new(other),
    }
}
