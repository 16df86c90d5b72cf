// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dataset previews for finished runs.
//!
//! A successful run's dataset can hold thousands of items; the caller gets
//! a bounded preview plus an inferred shape description instead of the raw
//! dump. Schema inference samples the first few items and reports the
//! union of keys with the JSON type seen under each.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value, json};

use gantry_core::bound::bound_items;
use gantry_core::error::GantryError;
use gantry_core::traits::PlatformAdapter;
use gantry_core::types::ItemQuery;

/// Items fetched from the dataset head for previewing.
pub const PREVIEW_FETCH_LIMIT: u32 = 100;

/// Items sampled for schema inference.
pub const SCHEMA_SAMPLE_SIZE: usize = 5;

/// A bounded view over a run's output dataset.
#[derive(Debug, Clone)]
pub struct DatasetPreview {
    pub dataset_id: String,
    /// Total items in the dataset, not just the fetched page.
    pub item_count: u64,
    /// Inferred item shape; `None` for an empty dataset.
    pub schema: Option<Value>,
    pub preview: Vec<Value>,
}

/// Fetches the head of a dataset and shapes it into a preview.
pub async fn dataset_preview(
    platform: &dyn PlatformAdapter,
    dataset_id: &str,
    important_fields: &[String],
    char_limit: usize,
) -> Result<DatasetPreview, GantryError> {
    let page = platform
        .dataset_items(
            dataset_id,
            ItemQuery {
                offset: 0,
                limit: PREVIEW_FETCH_LIMIT,
            },
        )
        .await?;

    let schema = if page.items.is_empty() {
        None
    } else {
        Some(infer_schema(&page.items))
    };
    let preview = bound_items(&page.items, important_fields, char_limit);

    Ok(DatasetPreview {
        dataset_id: dataset_id.to_string(),
        item_count: page.total,
        schema,
        preview,
    })
}

/// Infers an object schema from the first [`SCHEMA_SAMPLE_SIZE`] items.
///
/// Keys are unioned across the sample. A key seen with one JSON type gets
/// that type; mixed sightings get the sorted list of type names.
pub fn infer_schema(items: &[Value]) -> Value {
    let mut fields: BTreeMap<String, BTreeSet<&'static str>> = BTreeMap::new();
    for item in items.iter().take(SCHEMA_SAMPLE_SIZE) {
        if let Value::Object(map) = item {
            for (key, value) in map {
                fields
                    .entry(key.clone())
                    .or_default()
                    .insert(json_type_name(value));
            }
        }
    }

    let properties: Map<String, Value> = fields
        .into_iter()
        .map(|(key, types)| {
            let mut names: Vec<&str> = types.into_iter().collect();
            let type_value = if names.len() == 1 {
                json!(names.remove(0))
            } else {
                json!(names)
            };
            (key, json!({ "type": type_value }))
        })
        .collect();

    json!({ "type": "object", "properties": properties })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_type_keys_get_that_type() {
        let schema = infer_schema(&[
            json!({ "url": "https://a", "rank": 1 }),
            json!({ "url": "https://b", "rank": 2 }),
        ]);
        assert_eq!(
            schema,
            json!({
                "type": "object",
                "properties": {
                    "rank": { "type": "integer" },
                    "url": { "type": "string" }
                }
            })
        );
    }

    #[test]
    fn keys_are_unioned_across_the_sample() {
        let schema = infer_schema(&[json!({ "a": 1 }), json!({ "b": true })]);
        assert_eq!(
            schema["properties"],
            json!({
                "a": { "type": "integer" },
                "b": { "type": "boolean" }
            })
        );
    }

    #[test]
    fn mixed_types_report_the_sorted_type_list() {
        let schema = infer_schema(&[json!({ "v": "text" }), json!({ "v": null })]);
        assert_eq!(schema["properties"]["v"], json!({ "type": ["null", "string"] }));
    }

    #[test]
    fn sampling_stops_after_the_first_five_items() {
        let mut items: Vec<Value> = (0..SCHEMA_SAMPLE_SIZE)
            .map(|i| json!({ "n": i }))
            .collect();
        items.push(json!({ "late_key": "never sampled" }));

        let schema = infer_schema(&items);
        assert!(schema["properties"].get("late_key").is_none());
    }

    #[test]
    fn floats_and_integers_are_distinguished() {
        let schema = infer_schema(&[json!({ "price": 9.99, "count": 3 })]);
        assert_eq!(schema["properties"]["price"], json!({ "type": "number" }));
        assert_eq!(schema["properties"]["count"], json!({ "type": "integer" }));
    }

    #[test]
    fn non_object_items_contribute_nothing() {
        let schema = infer_schema(&[json!("bare string"), json!({ "k": 1 })]);
        assert_eq!(schema["properties"], json!({ "k": { "type": "integer" } }));
    }
}
