// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in tools, grouped into registration categories.
//!
//! Configuration selects categories, not individual tools: `discovery`
//! finds actors, `runtime` runs them, `storage` reads datasets, `tasks`
//! manages background tasks, and `default` is all of them. The mutating
//! pair (add-actor, remove-actor) is part of `runtime` but only when
//! mutation is enabled.

pub mod actors;
pub mod datasets;
pub mod runs;
pub mod tasks;

use std::collections::HashSet;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use gantry_core::error::GantryError;
use gantry_core::tool::{ToolCall, ToolEntry};

use crate::engine::Services;

pub const CATEGORY_DISCOVERY: &str = "discovery";
pub const CATEGORY_RUNTIME: &str = "runtime";
pub const CATEGORY_STORAGE: &str = "storage";
pub const CATEGORY_TASKS: &str = "tasks";
pub const CATEGORY_DEFAULT: &str = "default";

/// Every selectable category, `default` excluded.
pub const KNOWN_CATEGORIES: [&str; 4] = [
    CATEGORY_DISCOVERY,
    CATEGORY_RUNTIME,
    CATEGORY_STORAGE,
    CATEGORY_TASKS,
];

/// Entries for one category, or `None` for an unknown name.
pub fn entries_for_category(
    services: &Arc<Services>,
    category: &str,
) -> Result<Option<Vec<ToolEntry>>, GantryError> {
    let entries = match category {
        CATEGORY_DISCOVERY => vec![
            actors::search_actors_entry(services)?,
            actors::fetch_details_entry(services)?,
        ],
        CATEGORY_RUNTIME => {
            let mut entries = vec![
                actors::call_actor_entry(services)?,
                runs::get_run_entry(services)?,
            ];
            if services.options.enable_mutation {
                entries.push(actors::add_actor_entry(services)?);
                entries.push(actors::remove_actor_entry(services)?);
            }
            entries
        }
        CATEGORY_STORAGE => vec![datasets::get_dataset_items_entry(services)?],
        CATEGORY_TASKS => vec![
            tasks::get_task_entry(services)?,
            tasks::cancel_task_entry(services)?,
        ],
        CATEGORY_DEFAULT => {
            let mut entries = Vec::new();
            for category in KNOWN_CATEGORIES {
                entries.extend(
                    entries_for_category(services, category)?
                        .ok_or_else(|| GantryError::Internal("category table out of sync".into()))?,
                );
            }
            entries
        }
        _ => return Ok(None),
    };
    Ok(Some(entries))
}

/// Registers the configured categories, deduplicating overlaps.
///
/// Returns the number of tools registered. An unknown category name is a
/// configuration error, caught here rather than silently skipped.
pub async fn register_categories(
    services: &Arc<Services>,
    categories: &[String],
) -> Result<usize, GantryError> {
    let mut entries = Vec::new();
    for category in categories {
        let batch = entries_for_category(services, category)?.ok_or_else(|| {
            GantryError::Config(format!(
                "unknown tool category \"{category}\"; known categories: {}, default",
                KNOWN_CATEGORIES.join(", ")
            ))
        })?;
        entries.extend(batch);
    }

    let mut seen = HashSet::new();
    entries.retain(|entry| seen.insert(entry.name.clone()));
    let count = entries.len();

    let mut registry = services.registry.write().await;
    registry.upsert(entries, services.options.payment)?;
    Ok(count)
}

/// Deserializes call arguments into a typed parameter struct.
///
/// Schema validation already ran, so a failure here means the schema and
/// the struct drifted apart; it still surfaces as an argument error rather
/// than a crash.
pub(crate) fn parse_args<T: DeserializeOwned>(call: &ToolCall) -> Result<T, GantryError> {
    serde_json::from_value(call.arguments_value()).map_err(|err| GantryError::InvalidArguments {
        tool: call.tool_name.clone(),
        message: err.to_string(),
    })
}
