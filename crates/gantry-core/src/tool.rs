// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The tool model: entries, kinds, calls, and the internal-handler trait.
//!
//! A [`ToolEntry`] is one callable tool as the session sees it. The entry
//! carries everything needed to describe the tool over the wire (name,
//! description, schemas, annotations) plus a compiled argument validator
//! and a [`ToolKind`] telling the execution engine how to dispatch it.

use std::sync::Arc;

use async_trait::async_trait;
use jsonschema::{Draft, Validator};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};
use tokio_util::sync::CancellationToken;

use crate::error::GantryError;
use crate::traits::progress::ProgressSink;
use crate::types::{CallMeta, ExecutionResult, TaskSupport};

/// Schema property injected into payment-gated tools.
pub const PAYMENT_TOKEN_PROPERTY: &str = "payment_token";

/// Instructions appended once to the description of a payment-gated tool.
pub const PAYMENT_INSTRUCTIONS: &str = "This tool is payment-gated: pass a `payment_token` \
     argument issued by your payment provider, or the call will be rejected.";

/// Map a full actor name (`owner/actor`) to a legal tool name.
///
/// The slash becomes a double dash so the owner can be recovered visually,
/// and anything outside `[A-Za-z0-9_-]` is flattened to a dash.
pub fn actor_tool_name(full_name: &str) -> String {
    full_name
        .replace('/', "--")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Copy of the call arguments with secret values masked, for logging.
///
/// Only the top-level payment token is masked; that is the only secret the
/// schema augmentation ever injects.
pub fn redacted_arguments(arguments: &Map<String, Value>) -> Map<String, Value> {
    let mut out = arguments.clone();
    if let Some(token) = out.get_mut(PAYMENT_TOKEN_PROPERTY) {
        *token = Value::String("***".to_string());
    }
    out
}

/// MCP-style behavior hints attached to a tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only_hint: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destructive_hint: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotent_hint: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_world_hint: Option<bool>,
}

impl ToolAnnotations {
    pub fn read_only() -> Self {
        Self {
            read_only_hint: Some(true),
            ..Self::default()
        }
    }

    pub fn destructive() -> Self {
        Self {
            destructive_hint: Some(true),
            ..Self::default()
        }
    }

    pub fn open_world() -> Self {
        Self {
            open_world_hint: Some(true),
            ..Self::default()
        }
    }
}

/// One normalized tool invocation, as handed to a handler.
#[derive(Clone)]
pub struct ToolCall {
    pub tool_name: String,
    pub arguments: Map<String, Value>,
    pub meta: CallMeta,
    /// Sink for progress notifications, when the caller asked for them.
    pub progress: Option<Arc<dyn ProgressSink>>,
    /// Cancelled when the caller gives up or the owning task is cancelled.
    pub cancel: CancellationToken,
}

impl ToolCall {
    /// A bare call with just a name and arguments, for tests and internal use.
    pub fn new(tool_name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
            meta: CallMeta::default(),
            progress: None,
            cancel: CancellationToken::new(),
        }
    }

    /// The arguments as a JSON object value, for serde-based extraction.
    pub fn arguments_value(&self) -> Value {
        Value::Object(self.arguments.clone())
    }
}

impl std::fmt::Debug for ToolCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolCall")
            .field("tool_name", &self.tool_name)
            .field("arguments", &redacted_arguments(&self.arguments))
            .field("meta", &self.meta)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// A handler for a tool implemented inside this server.
#[async_trait]
pub trait InternalTool: Send + Sync {
    async fn run(&self, call: ToolCall) -> Result<ExecutionResult, GantryError>;
}

/// How the execution engine dispatches a tool.
#[derive(Clone)]
pub enum ToolKind {
    /// Runs in-process via an [`InternalTool`] handler.
    Internal { handler: Arc<dyn InternalTool> },
    /// Starts an actor run on the platform and summarizes its dataset.
    RemoteJob {
        actor_id: String,
        /// Full `owner/actor` name, kept for caller-facing messages.
        actor_name: String,
        memory_mbytes: Option<u32>,
        timeout_secs: Option<u64>,
    },
    /// Relays the call to a tool hosted on an actor's own tool server.
    Proxied {
        server_url: String,
        /// The tool's name on the origin server, before prefixing.
        origin_name: String,
        /// Actor id of the server owner; used for bulk removal.
        owner_id: String,
    },
}

impl ToolKind {
    pub fn tag(&self) -> ToolKindTag {
        match self {
            ToolKind::Internal { .. } => ToolKindTag::Internal,
            ToolKind::RemoteJob { .. } => ToolKindTag::RemoteJob,
            ToolKind::Proxied { .. } => ToolKindTag::Proxied,
        }
    }
}

impl std::fmt::Debug for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolKind::Internal { .. } => f.debug_struct("Internal").finish_non_exhaustive(),
            ToolKind::RemoteJob {
                actor_id,
                actor_name,
                memory_mbytes,
                timeout_secs,
            } => f
                .debug_struct("RemoteJob")
                .field("actor_id", actor_id)
                .field("actor_name", actor_name)
                .field("memory_mbytes", memory_mbytes)
                .field("timeout_secs", timeout_secs)
                .finish(),
            ToolKind::Proxied {
                server_url,
                origin_name,
                owner_id,
            } => f
                .debug_struct("Proxied")
                .field("server_url", server_url)
                .field("origin_name", origin_name)
                .field("owner_id", owner_id)
                .finish(),
        }
    }
}

/// Discriminant of [`ToolKind`], for filtering without matching payloads.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ToolKindTag {
    Internal,
    RemoteJob,
    Proxied,
}

/// One registered tool: wire description plus dispatch information.
#[derive(Clone)]
pub struct ToolEntry {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub output_schema: Option<Value>,
    pub annotations: Option<ToolAnnotations>,
    pub task_support: TaskSupport,
    /// When set, dispatch refuses calls without a `payment_token` argument.
    pub requires_payment_token: bool,
    /// Whether payment-mode registration may augment this entry at all.
    pub payment_eligible: bool,
    validator: Arc<Validator>,
    pub kind: ToolKind,
}

impl ToolEntry {
    /// Build an entry, compiling the argument validator from `input_schema`.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        kind: ToolKind,
    ) -> Result<Self, GantryError> {
        let validator = Arc::new(compile_schema(&input_schema)?);
        Ok(Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            output_schema: None,
            annotations: None,
            task_support: TaskSupport::default(),
            requires_payment_token: false,
            payment_eligible: false,
            validator,
            kind,
        })
    }

    pub fn with_output_schema(mut self, schema: Value) -> Self {
        self.output_schema = Some(schema);
        self
    }

    pub fn with_annotations(mut self, annotations: ToolAnnotations) -> Self {
        self.annotations = Some(annotations);
        self
    }

    pub fn with_task_support(mut self, support: TaskSupport) -> Self {
        self.task_support = support;
        self
    }

    pub fn with_payment_eligible(mut self) -> Self {
        self.payment_eligible = true;
        self
    }

    /// Check the call arguments against the compiled input schema.
    ///
    /// All violations are collected and joined into a single message, so the
    /// caller can fix everything in one retry.
    pub fn validate_arguments(&self, arguments: &Value) -> Result<(), GantryError> {
        let violations: Vec<String> = self
            .validator
            .iter_errors(arguments)
            .map(|err| err.to_string())
            .collect();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(GantryError::InvalidArguments {
                tool: self.name.clone(),
                message: violations.join("; "),
            })
        }
    }

    /// Return a copy of this entry with the payment-token parameter injected.
    ///
    /// Idempotent: an entry that already carries the token property and the
    /// description suffix comes back unchanged. The validator is recompiled
    /// whenever the schema actually changes.
    pub fn with_payment_token(&self) -> Result<Self, GantryError> {
        let mut entry = self.clone();
        entry.requires_payment_token = true;

        let mut schema_changed = false;
        if let Some(root) = entry.input_schema.as_object_mut() {
            let properties = root
                .entry("properties")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Some(properties) = properties.as_object_mut()
                && !properties.contains_key(PAYMENT_TOKEN_PROPERTY)
            {
                properties.insert(
                    PAYMENT_TOKEN_PROPERTY.to_string(),
                    serde_json::json!({
                        "type": "string",
                        "description": "Payment token authorizing the charge for this call."
                    }),
                );
                schema_changed = true;
            }
        }
        if schema_changed {
            entry.validator = Arc::new(compile_schema(&entry.input_schema)?);
        }

        if !entry.description.contains(PAYMENT_INSTRUCTIONS) {
            if !entry.description.is_empty() {
                entry.description.push(' ');
            }
            entry.description.push_str(PAYMENT_INSTRUCTIONS);
        }

        Ok(entry)
    }
}

impl std::fmt::Debug for ToolEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolEntry")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("task_support", &self.task_support)
            .field("requires_payment_token", &self.requires_payment_token)
            .finish_non_exhaustive()
    }
}

fn compile_schema(schema: &Value) -> Result<Validator, GantryError> {
    jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(schema)
        .map_err(|err| GantryError::Internal(format!("invalid tool schema: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search_entry() -> ToolEntry {
        ToolEntry::new(
            "search-actors",
            "Search the actor catalog",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string" },
                    "limit": { "type": "integer", "minimum": 1 }
                },
                "required": ["query"]
            }),
            ToolKind::RemoteJob {
                actor_id: "act-1".into(),
                actor_name: "gantry/search".into(),
                memory_mbytes: None,
                timeout_secs: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn actor_tool_name_mangles_slash_and_odd_chars() {
        assert_eq!(actor_tool_name("acme/web-scraper"), "acme--web-scraper");
        assert_eq!(actor_tool_name("acme/page.analyzer"), "acme--page-analyzer");
        assert_eq!(actor_tool_name("plain_name"), "plain_name");
    }

    #[test]
    fn validate_arguments_accepts_conforming_input() {
        let entry = search_entry();
        let args = serde_json::json!({ "query": "weather", "limit": 5 });
        assert!(entry.validate_arguments(&args).is_ok());
    }

    #[test]
    fn validate_arguments_collects_all_violations() {
        let entry = search_entry();
        let args = serde_json::json!({ "limit": 0 });
        let err = entry.validate_arguments(&args).unwrap_err();
        match err {
            GantryError::InvalidArguments { tool, message } => {
                assert_eq!(tool, "search-actors");
                // Both the missing required field and the range violation.
                assert!(message.contains("query"));
                assert!(message.contains("limit") || message.contains("minimum"));
            }
            other => panic!("expected InvalidArguments, got {other:?}"),
        }
    }

    #[test]
    fn payment_augmentation_injects_property_and_suffix() {
        let entry = search_entry().with_payment_token().unwrap();
        assert!(entry.requires_payment_token);
        assert!(
            entry.input_schema["properties"][PAYMENT_TOKEN_PROPERTY].is_object(),
            "token property must be present"
        );
        assert!(entry.description.contains(PAYMENT_INSTRUCTIONS));
        // The recompiled validator accepts the new property.
        let args = serde_json::json!({ "query": "weather", "payment_token": "tok_1" });
        assert!(entry.validate_arguments(&args).is_ok());
    }

    #[test]
    fn payment_augmentation_is_idempotent() {
        let once = search_entry().with_payment_token().unwrap();
        let twice = once.with_payment_token().unwrap();
        assert_eq!(once.description, twice.description);
        assert_eq!(once.input_schema, twice.input_schema);
        assert_eq!(
            twice.description.matches(PAYMENT_INSTRUCTIONS).count(),
            1,
            "instructions must not stack"
        );
    }

    #[test]
    fn payment_augmentation_does_not_touch_the_original() {
        let original = search_entry();
        let _augmented = original.with_payment_token().unwrap();
        assert!(!original.requires_payment_token);
        assert!(original.input_schema["properties"][PAYMENT_TOKEN_PROPERTY].is_null());
    }

    #[test]
    fn redaction_masks_only_the_token() {
        let mut args = Map::new();
        args.insert("query".into(), Value::String("weather".into()));
        args.insert(
            PAYMENT_TOKEN_PROPERTY.into(),
            Value::String("tok_secret".into()),
        );
        let redacted = redacted_arguments(&args);
        assert_eq!(redacted["query"], "weather");
        assert_eq!(redacted[PAYMENT_TOKEN_PROPERTY], "***");
        // The input map is untouched.
        assert_eq!(args[PAYMENT_TOKEN_PROPERTY], "tok_secret");
    }

    #[test]
    fn tool_call_debug_masks_the_token() {
        let mut args = Map::new();
        args.insert(
            PAYMENT_TOKEN_PROPERTY.into(),
            Value::String("tok_secret".into()),
        );
        let call = ToolCall::new("call-actor", args);
        let debug = format!("{call:?}");
        assert!(!debug.contains("tok_secret"));
    }

    #[test]
    fn kind_tags_round_trip_kebab_case() {
        use std::str::FromStr;
        assert_eq!(ToolKindTag::RemoteJob.to_string(), "remote-job");
        assert_eq!(
            ToolKindTag::from_str("proxied").unwrap(),
            ToolKindTag::Proxied
        );
    }
}
