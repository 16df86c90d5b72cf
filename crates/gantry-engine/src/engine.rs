// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The execution engine: one entry point per tool call.
//!
//! [`ExecutionEngine::execute`] is the only way a call reaches a handler.
//! It normalizes the call, picks a dispatch mode, runs the tool (inline,
//! detached, or as a tracked task), converts every error into a caller
//! honest [`ExecutionResult`], and records one telemetry event. Handlers
//! below this point return `Result`; callers above it never see one.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

use gantry_cache::TtlCache;
use gantry_core::error::GantryError;
use gantry_core::registry::{PaymentMode, ToolRegistry};
use gantry_core::tool::{ToolCall, ToolEntry, ToolKind, redacted_arguments};
use gantry_core::traits::{PlatformAdapter, TelemetryAdapter, ToolServerAdapter};
use gantry_core::types::{
    ActorDetails, CallEvent, ExecutionResult, TaskRequest, TaskStatus, ToolStatus,
};

use crate::normalize::{self, DispatchMode, ResolvedCall};
use crate::remote;
use crate::tasks::TaskTracker;

/// Tunables for the engine, resolved from configuration at startup.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Character budget for dataset previews and item reads.
    pub preview_char_limit: usize,
    /// Delay between run status polls.
    pub poll_interval: Duration,
    /// Longest a synchronous call waits for a run before handing back a
    /// pointer to it.
    pub max_sync_wait: Duration,
    /// Memory given to runs whose actor declares no default.
    pub default_memory_mbytes: u32,
    /// Timeout for runs whose actor declares no default. `None` leaves the
    /// platform's own default in force.
    pub default_timeout_secs: Option<u64>,
    /// Retention for task records whose request named no TTL.
    pub default_task_ttl: Duration,
    /// Entry budget for the details and discovery caches.
    pub cache_capacity: usize,
    /// Lifetime of cached actor details and discovery results.
    pub cache_ttl: Duration,
    /// Start every remote job detached instead of waiting inline.
    pub force_async: bool,
    /// Prefix stripped from incoming tool names during resolution.
    pub tool_prefix: Option<String>,
    pub payment: PaymentMode,
    /// Whether add-actor and remove-actor are registered at all.
    pub enable_mutation: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            preview_char_limit: 25_000,
            poll_interval: Duration::from_secs(2),
            max_sync_wait: Duration::from_secs(300),
            default_memory_mbytes: 1024,
            default_timeout_secs: None,
            default_task_ttl: Duration::from_secs(600),
            cache_capacity: 128,
            cache_ttl: Duration::from_secs(300),
            force_async: false,
            tool_prefix: None,
            payment: PaymentMode::Disabled,
            enable_mutation: true,
        }
    }
}

/// Shared state every handler works against.
///
/// Built once at startup and passed by `Arc`; the registry is the only
/// piece behind a lock, and handlers hold it only long enough to look up
/// or mutate entries, never across I/O.
pub struct Services {
    pub registry: RwLock<ToolRegistry>,
    pub platform: Arc<dyn PlatformAdapter>,
    pub tool_servers: Arc<dyn ToolServerAdapter>,
    pub tracker: TaskTracker,
    details_cache: TtlCache<String, Arc<ActorDetails>>,
    discovery_cache: TtlCache<String, Option<String>>,
    pub options: EngineOptions,
}

impl Services {
    pub fn new(
        platform: Arc<dyn PlatformAdapter>,
        tool_servers: Arc<dyn ToolServerAdapter>,
        options: EngineOptions,
    ) -> Arc<Self> {
        Arc::new(Self {
            registry: RwLock::new(ToolRegistry::new()),
            platform,
            tool_servers,
            tracker: TaskTracker::new(options.default_task_ttl),
            details_cache: TtlCache::new(options.cache_capacity, options.cache_ttl),
            discovery_cache: TtlCache::new(options.cache_capacity, options.cache_ttl),
            options,
        })
    }

    /// Actor details, cached under both the requested name and the
    /// canonical id so later lookups hit either way.
    pub async fn actor_details(&self, actor: &str) -> Result<Arc<ActorDetails>, GantryError> {
        let key = actor.to_string();
        if let Some(details) = self.details_cache.get(&key).await {
            return Ok(details);
        }
        let details = Arc::new(self.platform.actor_details(actor).await?);
        self.details_cache.set(key, Arc::clone(&details)).await;
        if details.id != actor {
            self.details_cache
                .set(details.id.clone(), Arc::clone(&details))
                .await;
        }
        if details.name != actor {
            self.details_cache
                .set(details.name.clone(), Arc::clone(&details))
                .await;
        }
        Ok(details)
    }

    /// Tool-server discovery with memoization of both outcomes. A `None`
    /// hit means the probe already ran and the actor is a plain batch job.
    pub async fn tool_server_url(&self, actor_id: &str) -> Result<Option<String>, GantryError> {
        let key = actor_id.to_string();
        if let Some(url) = self.discovery_cache.get(&key).await {
            return Ok(url);
        }
        let url = self.platform.tool_server_url(actor_id).await?;
        self.discovery_cache.set(key, url.clone()).await;
        Ok(url)
    }
}

/// Executes tool calls against the shared services.
#[derive(Clone)]
pub struct ExecutionEngine {
    services: Arc<Services>,
    telemetry: Arc<dyn TelemetryAdapter>,
}

impl ExecutionEngine {
    pub fn new(services: Arc<Services>, telemetry: Arc<dyn TelemetryAdapter>) -> Self {
        Self {
            services,
            telemetry,
        }
    }

    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    /// Runs one call end to end. Never returns an error: every failure is
    /// folded into the result's status and message.
    pub async fn execute(&self, call: ToolCall) -> ExecutionResult {
        let started = Instant::now();
        let requested = call.tool_name.clone();
        let session_id = call.meta.session_id.clone();

        let resolved = {
            let registry = self.services.registry.read().await;
            normalize::resolve(
                &registry,
                call,
                self.services.options.tool_prefix.as_deref(),
                self.services.options.force_async,
            )
        };

        let (tool_name, outcome) = match resolved {
            Ok(resolved) => {
                let name = resolved.entry.name.clone();
                (name, self.dispatch(resolved).await)
            }
            Err(err) => (requested, Err(err)),
        };

        let result = outcome.unwrap_or_else(|err| error_result(&tool_name, err));
        if result.status != ToolStatus::Succeeded {
            warn!(
                tool = %tool_name,
                status = %result.status,
                message = result.message.as_deref().unwrap_or(""),
                "tool call did not succeed"
            );
        }
        self.telemetry.record(CallEvent {
            tool_name,
            status: result.status,
            duration_ms: started.elapsed().as_millis() as u64,
            session_id,
        });
        result
    }

    async fn dispatch(&self, resolved: ResolvedCall) -> Result<ExecutionResult, GantryError> {
        match resolved.mode {
            DispatchMode::Sync => self.run_tool(resolved.entry, resolved.call).await,
            DispatchMode::Detached => {
                remote::start_detached(&self.services, &resolved.entry, &resolved.call).await
            }
            DispatchMode::Task(request) => self.spawn_task(resolved.entry, resolved.call, request),
        }
    }

    /// Dispatch on the entry's kind. Also the entry point for handlers that
    /// execute a tool they resolved themselves (task workers).
    pub(crate) async fn run_tool(
        &self,
        entry: Arc<ToolEntry>,
        call: ToolCall,
    ) -> Result<ExecutionResult, GantryError> {
        debug!(
            tool = %entry.name,
            kind = %entry.kind.tag(),
            arguments = ?redacted_arguments(&call.arguments),
            "dispatching tool call"
        );
        match &entry.kind {
            ToolKind::Internal { handler } => Arc::clone(handler).run(call).await,
            ToolKind::RemoteJob { .. } => remote::run_remote_job(&self.services, &entry, call).await,
            ToolKind::Proxied { .. } => remote::run_proxied(&self.services, &entry, call).await,
        }
    }

    /// Registers a task, spawns the worker, and answers immediately with
    /// the task id. The worker re-checks cancellation before starting and
    /// relies on the tracker to drop results that lose the cancel race.
    fn spawn_task(
        &self,
        entry: Arc<ToolEntry>,
        call: ToolCall,
        request: TaskRequest,
    ) -> Result<ExecutionResult, GantryError> {
        self.services.tracker.prune_expired();
        let ttl = request.ttl_secs.map(Duration::from_secs);
        let handle = self.services.tracker.create(&entry.name, ttl);

        let mut task_call = call;
        // The caller's request returns now; progress has nowhere to go, and
        // cancellation is owned by the task from here on.
        task_call.progress = None;
        task_call.cancel = handle.cancel.clone();
        let session_id = task_call.meta.session_id.clone();

        let engine = self.clone();
        let task_id = handle.task_id.clone();
        let tool_name = entry.name.clone();
        let task_entry = Arc::clone(&entry);
        tokio::spawn(async move {
            let started = Instant::now();
            if let Err(err) = engine.services.tracker.begin_working(&task_id) {
                debug!(task_id, error = %err, "task worker standing down");
                return;
            }
            let outcome = engine.run_tool(task_entry, task_call).await;
            let result = outcome.unwrap_or_else(|err| error_result(&tool_name, err));
            let status = result.status;
            if engine.services.tracker.store_result(&task_id, result) {
                debug!(task_id, status = %status, "task finished");
            } else {
                debug!(task_id, "task result dropped; task already finalized");
            }
            engine.telemetry.record(CallEvent {
                tool_name,
                status,
                duration_ms: started.elapsed().as_millis() as u64,
                session_id,
            });
        });

        Ok(ExecutionResult::succeeded_with_message(
            json!({ "task_id": handle.task_id, "status": TaskStatus::Created }),
            format!(
                "task {} started for {}; poll it with get-task and stop it with cancel-task",
                handle.task_id, entry.name
            ),
        ))
    }
}

/// Folds an error into a caller-facing result.
///
/// The message always names the tool and says what to try next; the status
/// comes from the error's own classification.
pub(crate) fn error_result(tool: &str, err: GantryError) -> ExecutionResult {
    let status = err.tool_status();
    if status == ToolStatus::Aborted {
        return ExecutionResult::aborted();
    }
    ExecutionResult {
        status,
        body: None,
        message: Some(caller_message(tool, &err)),
    }
}

fn caller_message(tool: &str, err: &GantryError) -> String {
    match err {
        GantryError::ToolNotFound { name, available } => format!(
            "Tool \"{name}\" is not registered. Available tools: {}. Use search-actors to find \
             actors and add-actor to register one as a tool.",
            available.join(", ")
        ),
        GantryError::InvalidArguments { tool, message } => format!(
            "Arguments for \"{tool}\" failed validation: {message}. Fix the arguments and call \
             it again."
        ),
        GantryError::MissingPaymentToken { tool } => format!(
            "\"{tool}\" is payment-gated: pass a payment_token argument and retry."
        ),
        GantryError::TaskNotFound { task_id } => format!(
            "Task \"{task_id}\" does not exist or has expired. Check the id, or start the work \
             again."
        ),
        GantryError::Platform { message, .. } => {
            format!("\"{tool}\" failed talking to the platform: {message}")
        }
        other => format!("\"{tool}\" failed: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tool_message_lists_alternatives() {
        let err = GantryError::ToolNotFound {
            name: "frobnicate".into(),
            available: vec!["get-run".into(), "search-actors".into()],
        };
        let result = error_result("frobnicate", err);
        assert_eq!(result.status, ToolStatus::SoftFail);
        let message = result.message.unwrap();
        assert!(message.contains("frobnicate"));
        assert!(message.contains("get-run, search-actors"));
        assert!(message.contains("add-actor"));
    }

    #[test]
    fn cancelled_calls_fold_to_a_bare_aborted_result() {
        let result = error_result("call-actor", GantryError::Cancelled);
        assert_eq!(result.status, ToolStatus::Aborted);
        assert!(result.body.is_none());
        assert!(result.message.is_none());
    }

    #[test]
    fn missing_token_message_names_the_argument() {
        let err = GantryError::MissingPaymentToken {
            tool: "acme--scraper".into(),
        };
        let result = error_result("acme--scraper", err);
        assert_eq!(result.status, ToolStatus::SoftFail);
        assert!(result.message.unwrap().contains("payment_token"));
    }

    #[test]
    fn platform_errors_keep_their_status_classification() {
        let soft = GantryError::Platform {
            message: "actor not found".into(),
            status: Some(404),
            source: None,
        };
        assert_eq!(error_result("t", soft).status, ToolStatus::SoftFail);

        let hard = GantryError::Platform {
            message: "internal".into(),
            status: Some(500),
            source: None,
        };
        assert_eq!(error_result("t", hard).status, ToolStatus::Failed);
    }

    #[test]
    fn default_options_are_sane() {
        let options = EngineOptions::default();
        assert!(options.preview_char_limit > 0);
        assert!(options.poll_interval < options.max_sync_wait);
        assert!(!options.force_async);
    }
}
