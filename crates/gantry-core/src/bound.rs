// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Size-bounding for dataset previews returned to a caller.
//!
//! Tool results travel through context windows, so previews degrade in
//! stages rather than truncating mid-document: first the full items, then a
//! projection onto the fields the actor author marked important, then a
//! prefix of the item list. Each stage only runs if the previous one still
//! exceeds the character limit.

use serde_json::{Map, Value};

/// Bound a list of items to `char_limit` serialized characters.
///
/// Degradation order:
/// 1. the full items, if they fit;
/// 2. items projected onto `important_fields` (skipped when the list is
///    empty, since projecting onto nothing would erase every item);
/// 3. the longest prefix of the stage-2 output that fits.
///
/// A single oversized item therefore yields an empty preview rather than a
/// syntactically broken one.
pub fn bound_items(items: &[Value], important_fields: &[String], char_limit: usize) -> Vec<Value> {
    if serialized_size(items) <= char_limit {
        return items.to_vec();
    }

    let candidates: Vec<Value> = if important_fields.is_empty() {
        items.to_vec()
    } else {
        let projected: Vec<Value> = items
            .iter()
            .map(|item| project(item, important_fields))
            .collect();
        if serialized_size(&projected) <= char_limit {
            return projected;
        }
        projected
    };

    truncate_to_fit(candidates, char_limit)
}

/// Look up a dot-separated path inside a JSON value.
///
/// Path segments descend into objects by key and into arrays by numeric
/// index. A missing segment anywhere yields `None`.
pub fn dot_get<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Project an item down to the given dot paths.
///
/// The result keeps the dot path as a flat key; paths absent from the item
/// are simply omitted, so an item containing none of the fields collapses
/// to an empty object.
fn project(item: &Value, fields: &[String]) -> Value {
    let mut out = Map::new();
    for field in fields {
        if let Some(found) = dot_get(item, field) {
            out.insert(field.clone(), found.clone());
        }
    }
    Value::Object(out)
}

/// Keep the longest prefix whose serialized list form fits the limit.
fn truncate_to_fit(items: Vec<Value>, char_limit: usize) -> Vec<Value> {
    let mut kept = Vec::new();
    // Brackets, plus one comma per item after the first.
    let mut total = 2;
    for item in items {
        let item_size = serialized_size_one(&item);
        let separator = if kept.is_empty() { 0 } else { 1 };
        if total + item_size + separator > char_limit {
            break;
        }
        total += item_size + separator;
        kept.push(item);
    }
    kept
}

fn serialized_size(items: &[Value]) -> usize {
    serde_json::to_string(items).map(|s| s.len()).unwrap_or(usize::MAX)
}

fn serialized_size_one(item: &Value) -> usize {
    serde_json::to_string(item).map(|s| s.len()).unwrap_or(usize::MAX)
}
