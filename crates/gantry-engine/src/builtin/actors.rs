// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Actor-facing built-ins: catalog search, detail lookup, direct calls,
//! and dynamic registration.
//!
//! `add-actor` is the discovery seam: it probes whether the actor runs as
//! a batch job or hosts its own tool server, and registers either one
//! remote-job tool or the server's whole tool list. `call-actor` runs any
//! actor without registering it, validating the nested input against the
//! actor's own schema first.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::{info, warn};

use gantry_core::error::GantryError;
use gantry_core::registry::PaymentMode;
use gantry_core::tool::{
    InternalTool, PAYMENT_TOKEN_PROPERTY, ToolAnnotations, ToolCall, ToolEntry, ToolKind,
    actor_tool_name,
};
use gantry_core::traits::RemoteTool;
use gantry_core::types::{ActorDetails, ExecutionResult, TaskSupport};

use crate::engine::Services;
use crate::remote;

use super::parse_args;

/// Longest description carried into a registered tool.
const DESCRIPTION_CHAR_LIMIT: usize = 500;

/// Longest readme returned by fetch-actor-details.
const README_CHAR_LIMIT: usize = 4_000;

pub(crate) fn search_actors_entry(services: &Arc<Services>) -> Result<ToolEntry, GantryError> {
    ToolEntry::new(
        "search-actors",
        "Search the actor catalog by free-text query. Returns summaries; use \
         fetch-actor-details for schemas and add-actor to register one as a tool.",
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Free-text search over actor names, titles, and descriptions."
                },
                "limit": { "type": "integer", "minimum": 1, "maximum": 50, "default": 10 },
                "offset": { "type": "integer", "minimum": 0, "default": 0 }
            },
            "required": ["query"]
        }),
        ToolKind::Internal {
            handler: Arc::new(SearchActors {
                services: Arc::clone(services),
            }),
        },
    )
    .map(|entry| entry.with_annotations(ToolAnnotations::read_only()))
}

pub(crate) fn fetch_details_entry(services: &Arc<Services>) -> Result<ToolEntry, GantryError> {
    ToolEntry::new(
        "fetch-actor-details",
        "Fetch one actor's full record: input schema, defaults, readme, and the fields it \
         marks as important in its output.",
        json!({
            "type": "object",
            "properties": {
                "actor": {
                    "type": "string",
                    "description": "Actor id or full owner/actor name."
                }
            },
            "required": ["actor"]
        }),
        ToolKind::Internal {
            handler: Arc::new(FetchActorDetails {
                services: Arc::clone(services),
            }),
        },
    )
    .map(|entry| entry.with_annotations(ToolAnnotations::read_only()))
}

pub(crate) fn call_actor_entry(services: &Arc<Services>) -> Result<ToolEntry, GantryError> {
    ToolEntry::new(
        "call-actor",
        "Run any actor by id or name without registering it first. The input is validated \
         against the actor's own schema; the result is a bounded summary of the run's dataset.",
        json!({
            "type": "object",
            "properties": {
                "actor": {
                    "type": "string",
                    "description": "Actor id or full owner/actor name."
                },
                "input": {
                    "type": "object",
                    "description": "Input passed to the actor, validated against its schema."
                },
                "memory_mbytes": { "type": "integer", "minimum": 128 },
                "timeout_secs": { "type": "integer", "minimum": 1 }
            },
            "required": ["actor"]
        }),
        ToolKind::Internal {
            handler: Arc::new(CallActor {
                services: Arc::clone(services),
            }),
        },
    )
    .map(|entry| {
        entry
            .with_task_support(TaskSupport::Optional)
            .with_payment_eligible()
            .with_annotations(ToolAnnotations::open_world())
    })
}

pub(crate) fn add_actor_entry(services: &Arc<Services>) -> Result<ToolEntry, GantryError> {
    ToolEntry::new(
        "add-actor",
        "Register an actor as a callable tool. Batch actors become one tool; actors hosting \
         their own tool server contribute their full tool list.",
        json!({
            "type": "object",
            "properties": {
                "actor": {
                    "type": "string",
                    "description": "Actor id or full owner/actor name."
                }
            },
            "required": ["actor"]
        }),
        ToolKind::Internal {
            handler: Arc::new(AddActor {
                services: Arc::clone(services),
            }),
        },
    )
}

pub(crate) fn remove_actor_entry(services: &Arc<Services>) -> Result<ToolEntry, GantryError> {
    ToolEntry::new(
        "remove-actor",
        "Remove a dynamically registered tool. Removing any tool of a tool-server actor \
         removes all tools from that server. Built-in tools cannot be removed.",
        json!({
            "type": "object",
            "properties": {
                "tool": {
                    "type": "string",
                    "description": "Registered tool name, or the actor name it was registered from."
                }
            },
            "required": ["tool"]
        }),
        ToolKind::Internal {
            handler: Arc::new(RemoveActor {
                services: Arc::clone(services),
            }),
        },
    )
    .map(|entry| entry.with_annotations(ToolAnnotations::destructive()))
}

/// Builds the remote-job entry an actor registers as.
pub(crate) fn entry_for_actor(details: &ActorDetails) -> Result<ToolEntry, GantryError> {
    ToolEntry::new(
        actor_tool_name(&details.name),
        tool_description(details),
        details.input_schema.clone(),
        ToolKind::RemoteJob {
            actor_id: details.id.clone(),
            actor_name: details.name.clone(),
            memory_mbytes: details.default_memory_mbytes,
            timeout_secs: details.default_timeout_secs,
        },
    )
    .map(|entry| {
        entry
            .with_task_support(TaskSupport::Optional)
            .with_payment_eligible()
            .with_annotations(ToolAnnotations::open_world())
    })
}

fn proxied_entry(
    base: &str,
    details: &ActorDetails,
    url: &str,
    tool: &RemoteTool,
) -> Result<ToolEntry, GantryError> {
    let description = tool
        .description
        .clone()
        .unwrap_or_else(|| format!("Tool {} from {}'s tool server.", tool.name, details.name));
    ToolEntry::new(
        actor_tool_name(&format!("{base}--{}", tool.name)),
        description,
        tool.input_schema.clone(),
        ToolKind::Proxied {
            server_url: url.to_string(),
            origin_name: tool.name.clone(),
            owner_id: details.id.clone(),
        },
    )
    .map(|entry| entry.with_payment_eligible())
}

fn tool_description(details: &ActorDetails) -> String {
    let mut text = match (&details.title, &details.description) {
        (Some(title), Some(description)) => format!("{title}. {description}"),
        (Some(title), None) => title.clone(),
        (None, Some(description)) => description.clone(),
        (None, None) => format!("Actor {}.", details.name),
    };
    truncate_chars(&mut text, DESCRIPTION_CHAR_LIMIT);
    text
}

fn truncate_chars(text: &mut String, limit: usize) {
    if text.chars().count() > limit {
        *text = text.chars().take(limit).collect();
        text.push_str("...");
    }
}

fn server_failure(actor: &str, stage: &str, err: GantryError) -> GantryError {
    let message = format!("{stage} {actor}'s tool server failed: {err}");
    GantryError::ToolServer {
        message,
        source: Some(Box::new(err)),
    }
}

/// What registering an actor produced.
pub enum RegisterOutcome {
    /// The actor runs as a batch job and registered as one tool.
    Job { tool: String, added: bool },
    /// The actor hosts a tool server; these tools were registered from it.
    Server { tools: Vec<String> },
}

/// Registers an actor as one or more tools.
///
/// Shared by the add-actor tool and startup loading of configured actors.
/// The discovery probe result is memoized, so repeated adds of batch
/// actors do not re-probe.
pub async fn register_actor(
    services: &Arc<Services>,
    actor: &str,
    auth_token: Option<&str>,
) -> Result<(Arc<ActorDetails>, RegisterOutcome), GantryError> {
    let details = services.actor_details(actor).await?;

    match services.tool_server_url(&details.id).await? {
        Some(url) => {
            let connection = services
                .tool_servers
                .connect(&url, auth_token, None)
                .await
                .map_err(|err| server_failure(&details.name, "connecting to", err))?;
            let listed = connection.list_tools().await;
            if let Err(err) = connection.close().await {
                warn!(url = %url, error = %err, "tool server close failed");
            }
            let tools = listed.map_err(|err| server_failure(&details.name, "listing tools on", err))?;

            let base = actor_tool_name(&details.name);
            let entries: Vec<ToolEntry> = tools
                .iter()
                .map(|tool| proxied_entry(&base, &details, &url, tool))
                .collect::<Result<_, _>>()?;

            let mut registry = services.registry.write().await;
            let registered = registry.upsert(entries, services.options.payment)?;
            let names: Vec<String> = registered.iter().map(|entry| entry.name.clone()).collect();
            info!(actor = %details.name, tools = names.len(), "registered tool-server actor");
            Ok((details, RegisterOutcome::Server { tools: names }))
        }
        None => {
            let entry = entry_for_actor(&details)?;
            let entry = if services.options.payment == PaymentMode::Required {
                entry.with_payment_token()?
            } else {
                entry
            };
            let name = entry.name.clone();
            let mut registry = services.registry.write().await;
            let added = registry.insert(entry);
            info!(actor = %details.name, tool = %name, added, "registered batch actor");
            Ok((details, RegisterOutcome::Job { tool: name, added }))
        }
    }
}

struct SearchActors {
    services: Arc<Services>,
}

#[derive(Deserialize)]
struct SearchArgs {
    query: String,
    #[serde(default = "default_search_limit")]
    limit: u32,
    #[serde(default)]
    offset: u32,
}

fn default_search_limit() -> u32 {
    10
}

#[async_trait]
impl InternalTool for SearchActors {
    async fn run(&self, call: ToolCall) -> Result<ExecutionResult, GantryError> {
        let args: SearchArgs = parse_args(&call)?;
        let actors = self
            .services
            .platform
            .search_actors(&args.query, args.limit, args.offset)
            .await?;
        let message = if actors.is_empty() {
            format!("no actors matched \"{}\"; broaden the query", args.query)
        } else {
            format!(
                "found {} actors; register one with add-actor or run it with call-actor",
                actors.len()
            )
        };
        Ok(ExecutionResult::succeeded_with_message(
            json!({ "query": args.query, "count": actors.len(), "actors": actors }),
            message,
        ))
    }
}

struct FetchActorDetails {
    services: Arc<Services>,
}

#[derive(Deserialize)]
struct DetailsArgs {
    actor: String,
}

#[async_trait]
impl InternalTool for FetchActorDetails {
    async fn run(&self, call: ToolCall) -> Result<ExecutionResult, GantryError> {
        let args: DetailsArgs = parse_args(&call)?;
        let details = self.services.actor_details(&args.actor).await?;

        let mut body = serde_json::to_value(details.as_ref())
            .map_err(|err| GantryError::Internal(format!("details serialization: {err}")))?;
        if let Some(readme) = body.get_mut("readme")
            && let Some(text) = readme.as_str()
            && text.chars().count() > README_CHAR_LIMIT
        {
            let truncated: String = text.chars().take(README_CHAR_LIMIT).collect();
            *readme = Value::String(format!("{truncated}\n[readme truncated]"));
        }

        Ok(ExecutionResult::succeeded_with_message(
            body,
            format!(
                "actor {} resolved; register it with add-actor or run it with call-actor",
                details.name
            ),
        ))
    }
}

struct CallActor {
    services: Arc<Services>,
}

#[derive(Deserialize)]
struct CallActorArgs {
    actor: String,
    #[serde(default)]
    input: Map<String, Value>,
    #[serde(default)]
    memory_mbytes: Option<u32>,
    #[serde(default)]
    timeout_secs: Option<u64>,
    #[serde(default)]
    payment_token: Option<String>,
}

#[async_trait]
impl InternalTool for CallActor {
    async fn run(&self, call: ToolCall) -> Result<ExecutionResult, GantryError> {
        let args: CallActorArgs = parse_args(&call)?;
        let details = self.services.actor_details(&args.actor).await?;

        let mut entry = entry_for_actor(&details)?;
        if let ToolKind::RemoteJob {
            memory_mbytes,
            timeout_secs,
            ..
        } = &mut entry.kind
        {
            if args.memory_mbytes.is_some() {
                *memory_mbytes = args.memory_mbytes;
            }
            if args.timeout_secs.is_some() {
                *timeout_secs = args.timeout_secs;
            }
        }
        if self.services.options.payment == PaymentMode::Required {
            entry = entry.with_payment_token()?;
        }

        let mut input = args.input;
        if let Some(token) = args.payment_token {
            input.insert(PAYMENT_TOKEN_PROPERTY.to_string(), Value::String(token));
        }
        entry.validate_arguments(&Value::Object(input.clone()))?;

        let inner = ToolCall {
            tool_name: entry.name.clone(),
            arguments: input,
            meta: call.meta.clone(),
            progress: call.progress.clone(),
            cancel: call.cancel.clone(),
        };
        remote::run_remote_job(&self.services, &entry, inner).await
    }
}

struct AddActor {
    services: Arc<Services>,
}

#[derive(Deserialize)]
struct AddArgs {
    actor: String,
}

#[async_trait]
impl InternalTool for AddActor {
    async fn run(&self, call: ToolCall) -> Result<ExecutionResult, GantryError> {
        let args: AddArgs = parse_args(&call)?;
        let (details, outcome) =
            register_actor(&self.services, &args.actor, call.meta.auth_token.as_deref()).await?;

        let (body, message) = match outcome {
            RegisterOutcome::Server { tools } => {
                let message = if tools.is_empty() {
                    format!("{} hosts a tool server but lists no tools", details.name)
                } else {
                    format!(
                        "registered {} tools from {}'s tool server",
                        tools.len(),
                        details.name
                    )
                };
                (
                    json!({ "actor": details.name, "kind": "tool-server", "tools": tools }),
                    message,
                )
            }
            RegisterOutcome::Job { tool, added } => {
                let message = if added {
                    format!("registered {} as tool {tool}; call it directly", details.name)
                } else {
                    format!("{tool} is already registered")
                };
                (
                    json!({ "actor": details.name, "kind": "remote-job", "tool": tool, "added": added }),
                    message,
                )
            }
        };
        Ok(ExecutionResult::succeeded_with_message(body, message))
    }
}

struct RemoveActor {
    services: Arc<Services>,
}

#[derive(Deserialize)]
struct RemoveArgs {
    tool: String,
}

#[async_trait]
impl InternalTool for RemoveActor {
    async fn run(&self, call: ToolCall) -> Result<ExecutionResult, GantryError> {
        let args: RemoveArgs = parse_args(&call)?;
        let mut registry = self.services.registry.write().await;

        let target = if registry.contains(&args.tool) {
            args.tool.clone()
        } else {
            actor_tool_name(&args.tool)
        };
        let Some(entry) = registry.get(&target) else {
            return Ok(ExecutionResult::succeeded_with_message(
                json!({ "removed": [] }),
                format!("no registered tool matches \"{}\"; nothing removed", args.tool),
            ));
        };

        let names: Vec<String> = match &entry.kind {
            ToolKind::Internal { .. } => {
                return Ok(ExecutionResult::soft_fail(format!(
                    "\"{target}\" is a built-in tool and cannot be removed"
                )));
            }
            ToolKind::Proxied { owner_id, .. } => {
                let owner = owner_id.clone();
                registry
                    .entries()
                    .iter()
                    .filter_map(|entry| match &entry.kind {
                        ToolKind::Proxied { owner_id, .. } if *owner_id == owner => {
                            Some(entry.name.clone())
                        }
                        _ => None,
                    })
                    .collect()
            }
            ToolKind::RemoteJob { .. } => vec![target.clone()],
        };

        let removed = registry.remove(&names);
        let message = match removed.len() {
            1 => format!("removed {}", removed[0]),
            n => format!("removed {n} tools from the same tool server"),
        };
        Ok(ExecutionResult::succeeded_with_message(
            json!({ "removed": removed }),
            message,
        ))
    }
}
