// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dataset read built-in.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use gantry_core::bound::bound_items;
use gantry_core::error::GantryError;
use gantry_core::tool::{InternalTool, ToolAnnotations, ToolCall, ToolEntry, ToolKind};
use gantry_core::types::{ExecutionResult, ItemQuery};

use crate::engine::Services;

use super::parse_args;

pub(crate) fn get_dataset_items_entry(services: &Arc<Services>) -> Result<ToolEntry, GantryError> {
    ToolEntry::new(
        "get-dataset-items",
        "Read a page of items from a dataset. Pass fields to project items down to the paths \
         you need; oversized pages are truncated to fit the response budget.",
        json!({
            "type": "object",
            "properties": {
                "dataset_id": { "type": "string" },
                "offset": { "type": "integer", "minimum": 0, "default": 0 },
                "limit": { "type": "integer", "minimum": 1, "maximum": 1000, "default": 100 },
                "fields": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Dot paths to keep, e.g. [\"title\", \"crawl.url\"]."
                }
            },
            "required": ["dataset_id"]
        }),
        ToolKind::Internal {
            handler: Arc::new(GetDatasetItems {
                services: Arc::clone(services),
            }),
        },
    )
    .map(|entry| entry.with_annotations(ToolAnnotations::read_only()))
}

struct GetDatasetItems {
    services: Arc<Services>,
}

#[derive(Deserialize)]
struct GetItemsArgs {
    dataset_id: String,
    #[serde(default)]
    offset: u32,
    #[serde(default = "default_limit")]
    limit: u32,
    #[serde(default)]
    fields: Vec<String>,
}

fn default_limit() -> u32 {
    100
}

#[async_trait]
impl InternalTool for GetDatasetItems {
    async fn run(&self, call: ToolCall) -> Result<ExecutionResult, GantryError> {
        let args: GetItemsArgs = parse_args(&call)?;
        let page = self
            .services
            .platform
            .dataset_items(
                &args.dataset_id,
                ItemQuery {
                    offset: args.offset,
                    limit: args.limit,
                },
            )
            .await?;

        let items = bound_items(
            &page.items,
            &args.fields,
            self.services.options.preview_char_limit,
        );
        let truncated = items.len() < page.items.len();

        let message = if truncated {
            format!(
                "returning {} of {} fetched items to stay within the response size limit; \
                 narrow with fields or page with offset and limit",
                items.len(),
                page.items.len()
            )
        } else {
            format!(
                "returning {} items (dataset total {})",
                items.len(),
                page.total
            )
        };

        Ok(ExecutionResult::succeeded_with_message(
            json!({
                "dataset_id": args.dataset_id,
                "items": items,
                "total": page.total,
                "offset": page.offset,
                "limit": page.limit,
                "truncated": truncated,
            }),
            message,
        ))
    }
}
