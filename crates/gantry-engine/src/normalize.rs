// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Call normalization: name resolution, argument repair, validation, and
//! dispatch mode selection.
//!
//! Clients mangle tool names in predictable ways (client-side namespaces
//! glued on with `__`, a configured prefix) and some cannot produce literal
//! dots in argument keys, sending `-dot-` instead. Normalization undoes
//! both before the call reaches a handler, so every later stage sees the
//! canonical name and schema-true arguments.

use std::sync::Arc;

use serde_json::{Map, Value};

use gantry_core::error::GantryError;
use gantry_core::registry::ToolRegistry;
use gantry_core::tool::{ToolCall, ToolEntry, ToolKind};
use gantry_core::types::{TaskRequest, TaskSupport};

/// How a resolved call should be executed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DispatchMode {
    /// Run inline and return the result in the response.
    Sync,
    /// Start the work and return a pointer to it immediately (forced-async
    /// surfaces; only remote jobs detach this way).
    Detached,
    /// Run as a tracked background task.
    Task(TaskRequest),
}

/// A call that passed normalization, bound to its registry entry.
#[derive(Debug)]
pub struct ResolvedCall {
    pub entry: Arc<ToolEntry>,
    pub call: ToolCall,
    pub mode: DispatchMode,
}

/// Resolves a call against the registry.
///
/// Name lookup tries, in order: the exact name, the name with a client-side
/// `__` namespace stripped, and the name with the configured prefix
/// stripped. Failure reports the registered names so the caller can
/// correct itself.
pub fn resolve(
    registry: &ToolRegistry,
    mut call: ToolCall,
    prefix: Option<&str>,
    force_async: bool,
) -> Result<ResolvedCall, GantryError> {
    let entry = lookup(registry, &call.tool_name, prefix).ok_or_else(|| {
        GantryError::ToolNotFound {
            name: call.tool_name.clone(),
            available: registry.names(),
        }
    })?;
    call.tool_name = entry.name.clone();

    call.arguments = decode_dot_keys_map(call.arguments);
    entry.validate_arguments(&Value::Object(call.arguments.clone()))?;

    let mode = dispatch_mode(&entry, call.meta.task, force_async)?;
    Ok(ResolvedCall { entry, call, mode })
}

fn lookup(registry: &ToolRegistry, name: &str, prefix: Option<&str>) -> Option<Arc<ToolEntry>> {
    if let Some(entry) = registry.get(name) {
        return Some(entry);
    }
    // Clients that namespace tools glue their prefix on with `__`.
    if let Some((_, stripped)) = name.rsplit_once("__")
        && let Some(entry) = registry.get(stripped)
    {
        return Some(entry);
    }
    if let Some(prefix) = prefix
        && let Some(stripped) = name.strip_prefix(prefix)
        && let Some(entry) = registry.get(stripped)
    {
        return Some(entry);
    }
    None
}

fn dispatch_mode(
    entry: &ToolEntry,
    task: Option<TaskRequest>,
    force_async: bool,
) -> Result<DispatchMode, GantryError> {
    match (task, entry.task_support) {
        (Some(request), TaskSupport::Optional | TaskSupport::Required) => {
            Ok(DispatchMode::Task(request))
        }
        (Some(_), TaskSupport::Forbidden) => Err(GantryError::InvalidArguments {
            tool: entry.name.clone(),
            message: "this tool does not support background task execution; call it without a \
                      task request"
                .into(),
        }),
        (None, TaskSupport::Required) => Err(GantryError::InvalidArguments {
            tool: entry.name.clone(),
            message: "this tool only runs as a background task; pass a task request".into(),
        }),
        (None, _) => {
            if force_async && matches!(entry.kind, ToolKind::RemoteJob { .. }) {
                Ok(DispatchMode::Detached)
            } else {
                Ok(DispatchMode::Sync)
            }
        }
    }
}

/// Rewrites `-dot-` argument keys back to dots, recursively.
pub fn decode_dot_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(decode_dot_keys_map(map)),
        Value::Array(items) => Value::Array(items.into_iter().map(decode_dot_keys).collect()),
        other => other,
    }
}

fn decode_dot_keys_map(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .map(|(key, value)| (key.replace("-dot-", "."), decode_dot_keys(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gantry_core::registry::PaymentMode;
    use gantry_core::tool::InternalTool;
    use gantry_core::types::{ExecutionResult, ToolStatus};
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl InternalTool for Echo {
        async fn run(&self, call: ToolCall) -> Result<ExecutionResult, GantryError> {
            Ok(ExecutionResult::succeeded(Value::Object(call.arguments)))
        }
    }

    fn internal_entry(name: &str) -> ToolEntry {
        ToolEntry::new(
            name,
            "test tool",
            json!({
                "type": "object",
                "properties": { "query": { "type": "string" } },
                "required": ["query"]
            }),
            ToolKind::Internal {
                handler: Arc::new(Echo),
            },
        )
        .unwrap()
    }

    fn remote_entry(name: &str) -> ToolEntry {
        ToolEntry::new(
            name,
            "remote job",
            json!({ "type": "object" }),
            ToolKind::RemoteJob {
                actor_id: "act-1".into(),
                actor_name: "acme/scraper".into(),
                memory_mbytes: None,
                timeout_secs: None,
            },
        )
        .unwrap()
    }

    fn registry_with(entries: Vec<ToolEntry>) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry
            .upsert(entries, PaymentMode::Disabled)
            .expect("fixture entries upsert");
        registry
    }

    fn call(name: &str, arguments: Value) -> ToolCall {
        let Value::Object(map) = arguments else {
            panic!("arguments fixture must be an object");
        };
        ToolCall::new(name, map)
    }

    #[test]
    fn exact_name_resolves() {
        let registry = registry_with(vec![internal_entry("search-actors")]);
        let resolved = resolve(
            &registry,
            call("search-actors", json!({ "query": "x" })),
            None,
            false,
        )
        .unwrap();
        assert_eq!(resolved.entry.name, "search-actors");
        assert_eq!(resolved.mode, DispatchMode::Sync);
    }

    #[test]
    fn client_namespace_is_stripped_at_the_last_double_underscore() {
        let registry = registry_with(vec![internal_entry("search-actors")]);
        let resolved = resolve(
            &registry,
            call("gantry__search-actors", json!({ "query": "x" })),
            None,
            false,
        )
        .unwrap();
        assert_eq!(resolved.call.tool_name, "search-actors");
    }

    #[test]
    fn configured_prefix_is_stripped() {
        let registry = registry_with(vec![internal_entry("search-actors")]);
        let resolved = resolve(
            &registry,
            call("acme-search-actors", json!({ "query": "x" })),
            Some("acme-"),
            false,
        )
        .unwrap();
        assert_eq!(resolved.call.tool_name, "search-actors");
    }

    #[test]
    fn unknown_name_reports_available_tools() {
        let registry = registry_with(vec![internal_entry("search-actors")]);
        let err = resolve(
            &registry,
            call("no-such-tool", json!({})),
            None,
            false,
        )
        .unwrap_err();
        assert_eq!(err.tool_status(), ToolStatus::SoftFail);
        match err {
            GantryError::ToolNotFound { name, available } => {
                assert_eq!(name, "no-such-tool");
                assert_eq!(available, vec!["search-actors"]);
            }
            other => panic!("expected ToolNotFound, got {other:?}"),
        }
    }

    #[test]
    fn dot_keys_are_decoded_recursively() {
        let decoded = decode_dot_keys(json!({
            "options-dot-deep": { "inner-dot-most": 1 },
            "items": [ { "k-dot-x": 2 } ],
            "plain": true
        }));
        assert_eq!(
            decoded,
            json!({
                "options.deep": { "inner.most": 1 },
                "items": [ { "k.x": 2 } ],
                "plain": true
            })
        );
    }

    #[test]
    fn arguments_failing_the_schema_are_rejected() {
        let registry = registry_with(vec![internal_entry("search-actors")]);
        let err = resolve(
            &registry,
            call("search-actors", json!({ "query": 7 })),
            None,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, GantryError::InvalidArguments { .. }));
        assert_eq!(err.tool_status(), ToolStatus::SoftFail);
    }

    #[test]
    fn task_request_against_a_forbidden_tool_is_rejected() {
        let registry = registry_with(vec![internal_entry("search-actors")]);
        let mut request = call("search-actors", json!({ "query": "x" }));
        request.meta.task = Some(TaskRequest::default());
        let err = resolve(&registry, request, None, false).unwrap_err();
        assert!(matches!(err, GantryError::InvalidArguments { .. }));
    }

    #[test]
    fn task_required_without_a_request_is_rejected() {
        let entry = internal_entry("slow-tool").with_task_support(TaskSupport::Required);
        let registry = registry_with(vec![entry]);
        let err = resolve(
            &registry,
            call("slow-tool", json!({ "query": "x" })),
            None,
            false,
        )
        .unwrap_err();
        assert!(matches!(err, GantryError::InvalidArguments { .. }));
    }

    #[test]
    fn optional_task_support_with_a_request_runs_as_a_task() {
        let entry = internal_entry("slow-tool").with_task_support(TaskSupport::Optional);
        let registry = registry_with(vec![entry]);
        let mut request = call("slow-tool", json!({ "query": "x" }));
        request.meta.task = Some(TaskRequest {
            ttl_secs: Some(120),
        });
        let resolved = resolve(&registry, request, None, false).unwrap();
        assert!(matches!(
            resolved.mode,
            DispatchMode::Task(TaskRequest {
                ttl_secs: Some(120)
            })
        ));
    }

    #[test]
    fn force_async_detaches_remote_jobs_but_not_internal_tools() {
        let registry = registry_with(vec![
            internal_entry("search-actors"),
            remote_entry("acme--scraper"),
        ]);

        let remote = resolve(&registry, call("acme--scraper", json!({})), None, true).unwrap();
        assert_eq!(remote.mode, DispatchMode::Detached);

        let internal = resolve(
            &registry,
            call("search-actors", json!({ "query": "x" })),
            None,
            true,
        )
        .unwrap();
        assert_eq!(internal.mode, DispatchMode::Sync);
    }
}
