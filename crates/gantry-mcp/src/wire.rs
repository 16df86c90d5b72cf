// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Boundary conversions between protocol types and engine types.

use std::sync::Arc;

use rmcp::model::{CallToolResult, Content, Tool, ToolAnnotations};
use serde_json::{Map, Value};

use gantry_core::tool::ToolEntry;
use gantry_core::types::{CallMeta, ExecutionResult, ToolStatus};

/// Builds the wire descriptor for a registry entry, applying the configured
/// listing prefix to the name. The prefix is purely cosmetic; inbound calls
/// are resolved with or without it.
pub(crate) fn tool_descriptor(entry: &ToolEntry, prefix: Option<&str>) -> Tool {
    let name = match prefix {
        Some(prefix) => format!("{prefix}{}", entry.name),
        None => entry.name.clone(),
    };
    let schema = entry.input_schema.as_object().cloned().unwrap_or_default();
    let mut tool = Tool::new(name, entry.description.clone(), Arc::new(schema));
    if let Some(schema) = entry.output_schema.as_ref().and_then(Value::as_object) {
        tool.output_schema = Some(Arc::new(schema.clone()));
    }
    if let Some(annotations) = &entry.annotations {
        tool.annotations = Some(ToolAnnotations {
            read_only_hint: annotations.read_only_hint,
            destructive_hint: annotations.destructive_hint,
            idempotent_hint: annotations.idempotent_hint,
            open_world_hint: annotations.open_world_hint,
            ..Default::default()
        });
    }
    tool
}

/// Extracts per-call metadata from the request's meta object. Arguments are
/// never consulted; a key that is missing or has the wrong shape reads as
/// absent.
pub(crate) fn call_meta(meta: &Map<String, Value>) -> CallMeta {
    CallMeta {
        auth_token: meta
            .get("auth_token")
            .and_then(Value::as_str)
            .map(str::to_owned),
        session_id: meta
            .get("session_id")
            .and_then(Value::as_str)
            .map(str::to_owned),
        rented_actor_ids: meta
            .get("rented_actor_ids")
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default(),
        task: meta
            .get("task")
            .and_then(|value| serde_json::from_value(value.clone()).ok()),
    }
}

/// Converts an engine result into the protocol result shape.
///
/// A successful body becomes structured content, with any accompanying
/// message folded into an object body under `"message"` when the body does
/// not already claim that key. Every failure flavor comes back as a tool
/// error carrying the message as text, so the caller can read it and
/// correct itself where that is possible.
pub(crate) fn call_tool_result(result: ExecutionResult) -> CallToolResult {
    match result.status {
        ToolStatus::Succeeded => match (result.body, result.message) {
            (Some(body), Some(message)) => CallToolResult::structured(with_message(body, message)),
            (Some(body), None) => CallToolResult::structured(body),
            (None, message) => CallToolResult::success(vec![Content::text(
                message.unwrap_or_else(|| "done".to_string()),
            )]),
        },
        ToolStatus::SoftFail | ToolStatus::Failed => CallToolResult::error(vec![Content::text(
            result
                .message
                .unwrap_or_else(|| "the tool failed without a message".to_string()),
        )]),
        ToolStatus::Aborted => CallToolResult::error(vec![Content::text(
            result
                .message
                .unwrap_or_else(|| "the call was cancelled before it finished".to_string()),
        )]),
    }
}

fn with_message(body: Value, message: String) -> Value {
    match body {
        Value::Object(mut map) => {
            if !map.contains_key("message") {
                map.insert("message".to_string(), Value::String(message));
            }
            Value::Object(map)
        }
        other => other,
    }
}
