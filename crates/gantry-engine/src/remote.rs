// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch paths that leave the process: actor runs and proxied tool
//! servers.
//!
//! A remote job is start → poll → summarize, with the caller's
//! cancellation racing the poll loop. Cancellation aborts the platform run
//! exactly once, non-gracefully, and reports `ABORTED` with no body. A
//! proxied call opens a fresh connection to the actor's own tool server,
//! relays the call, and closes the connection no matter how the call went.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{info, warn};

use gantry_core::error::GantryError;
use gantry_core::tool::{PAYMENT_TOKEN_PROPERTY, ToolCall, ToolEntry, ToolKind};
use gantry_core::types::{ExecutionResult, Run, RunOptions, RunStatus, RunSummary};

use crate::engine::Services;
use crate::preview;
use crate::progress::{RunPoller, RunWait};

/// Starts a run and returns a pointer to it without waiting.
pub(crate) async fn start_detached(
    services: &Arc<Services>,
    entry: &ToolEntry,
    call: &ToolCall,
) -> Result<ExecutionResult, GantryError> {
    let ToolKind::RemoteJob {
        actor_id,
        actor_name,
        memory_mbytes,
        timeout_secs,
    } = &entry.kind
    else {
        return Err(GantryError::Internal(
            "detached dispatch requires a remote-job tool".into(),
        ));
    };
    check_payment(entry, call, actor_id)?;

    let (input, options) = job_parameters(services, call, *memory_mbytes, *timeout_secs);
    let run = services.platform.start_run(actor_id, input, options).await?;
    info!(tool = %entry.name, run_id = %run.id, actor = %actor_name, "actor run started detached");

    Ok(ExecutionResult::succeeded_with_message(
        run_pointer(&run, actor_name),
        format!(
            "run {} started for {actor_name}; poll get-run for status and read items with \
             get-dataset-items once it finishes",
            run.id
        ),
    ))
}

/// Runs an actor to completion and summarizes its output dataset.
pub(crate) async fn run_remote_job(
    services: &Arc<Services>,
    entry: &ToolEntry,
    call: ToolCall,
) -> Result<ExecutionResult, GantryError> {
    let ToolKind::RemoteJob {
        actor_id,
        actor_name,
        memory_mbytes,
        timeout_secs,
    } = &entry.kind
    else {
        return Err(GantryError::Internal(
            "remote-job dispatch on a non-remote tool".into(),
        ));
    };
    check_payment(entry, &call, actor_id)?;
    if call.cancel.is_cancelled() {
        return Err(GantryError::Cancelled);
    }

    let (input, options) = job_parameters(services, &call, *memory_mbytes, *timeout_secs);
    let run = services.platform.start_run(actor_id, input, options).await?;
    info!(tool = %entry.name, run_id = %run.id, actor = %actor_name, "actor run started");

    let poller = RunPoller::new(services.options.poll_interval);
    let wait = poller
        .await_finish(
            services.platform.as_ref(),
            &run.id,
            call.progress.as_ref(),
            &call.cancel,
            Some(services.options.max_sync_wait),
        )
        .await?;

    let run = match wait {
        RunWait::Cancelled => {
            info!(run_id = %run.id, "call cancelled; aborting actor run");
            if let Err(err) = services.platform.abort_run(&run.id, false).await {
                warn!(run_id = %run.id, error = %err, "abort after cancellation failed");
            }
            return Ok(ExecutionResult::aborted());
        }
        RunWait::DeadlineExceeded(snapshot) => {
            return Ok(ExecutionResult::succeeded_with_message(
                run_pointer(&snapshot, actor_name),
                format!(
                    "run {} is still {} after {}s; poll get-run for status and read items with \
                     get-dataset-items when it finishes",
                    snapshot.id,
                    snapshot.status,
                    services.options.max_sync_wait.as_secs()
                ),
            ));
        }
        RunWait::Finished(run) => run,
    };

    match run.status {
        RunStatus::Succeeded => summarize_run(services, actor_name, run).await,
        // Aborted from outside this call (platform console, another client).
        RunStatus::Aborted => Ok(ExecutionResult::aborted()),
        RunStatus::TimedOut => Ok(ExecutionResult::soft_fail(format!(
            "actor {actor_name} run {} timed out{}; raise timeout_secs or shrink the input and \
             retry",
            run.id,
            status_suffix(&run)
        ))),
        _ => Ok(ExecutionResult::failed(format!(
            "actor {actor_name} run {} finished as {}{}; check the input and the run log on the \
             platform",
            run.id,
            run.status,
            status_suffix(&run)
        ))),
    }
}

/// Relays a call to a tool on an actor's own server.
pub(crate) async fn run_proxied(
    services: &Arc<Services>,
    entry: &ToolEntry,
    call: ToolCall,
) -> Result<ExecutionResult, GantryError> {
    let ToolKind::Proxied {
        server_url,
        origin_name,
        owner_id,
    } = &entry.kind
    else {
        return Err(GantryError::Internal(
            "proxied dispatch on a non-proxied tool".into(),
        ));
    };
    check_payment(entry, &call, owner_id)?;
    if call.cancel.is_cancelled() {
        return Err(GantryError::Cancelled);
    }

    let connection = services
        .tool_servers
        .connect(server_url, call.meta.auth_token.as_deref(), call.progress.clone())
        .await
        .map_err(|err| server_error(origin_name, owner_id, "connecting to", err))?;

    let outcome = tokio::select! {
        _ = call.cancel.cancelled() => Err(GantryError::Cancelled),
        result = connection.call_tool(origin_name, call.arguments.clone()) => result,
    };

    // The connection closes on every path, including failures.
    if let Err(err) = connection.close().await {
        warn!(server_url = %server_url, error = %err, "tool server close failed");
    }

    let value = outcome.map_err(|err| match err {
        GantryError::Cancelled => GantryError::Cancelled,
        err => server_error(origin_name, owner_id, "calling", err),
    })?;
    Ok(ExecutionResult::succeeded(value))
}

/// Rejects payment-gated calls that carry no token, unless the caller
/// already rents the actor.
fn check_payment(entry: &ToolEntry, call: &ToolCall, actor_id: &str) -> Result<(), GantryError> {
    if !entry.requires_payment_token {
        return Ok(());
    }
    if call.arguments.contains_key(PAYMENT_TOKEN_PROPERTY) {
        return Ok(());
    }
    if call.meta.rented_actor_ids.iter().any(|id| id == actor_id) {
        return Ok(());
    }
    Err(GantryError::MissingPaymentToken {
        tool: entry.name.clone(),
    })
}

fn server_error(origin: &str, owner_id: &str, doing: &str, err: GantryError) -> GantryError {
    let message = format!("{doing} tool {origin} on the server of actor {owner_id}: {err}");
    GantryError::ToolServer {
        message,
        source: Some(Box::new(err)),
    }
}

fn job_parameters(
    services: &Services,
    call: &ToolCall,
    memory_mbytes: Option<u32>,
    timeout_secs: Option<u64>,
) -> (Value, RunOptions) {
    let input = Value::Object(call.arguments.clone());
    let options = RunOptions {
        memory_mbytes: Some(memory_mbytes.unwrap_or(services.options.default_memory_mbytes)),
        timeout_secs: timeout_secs.or(services.options.default_timeout_secs),
    };
    (input, options)
}

fn run_pointer(run: &Run, actor_name: &str) -> Value {
    json!({
        "run_id": run.id,
        "actor": actor_name,
        "status": run.status,
        "dataset_id": run.default_dataset_id,
    })
}

fn status_suffix(run: &Run) -> String {
    run.status_message
        .as_ref()
        .map(|message| format!(" ({message})"))
        .unwrap_or_default()
}

async fn summarize_run(
    services: &Arc<Services>,
    actor_name: &str,
    run: Run,
) -> Result<ExecutionResult, GantryError> {
    let mut summary = RunSummary {
        run_id: run.id.clone(),
        actor: actor_name.to_string(),
        status: run.status,
        dataset_id: run.default_dataset_id.clone(),
        item_count: 0,
        schema: None,
        preview: Vec::new(),
        duration_ms: run.duration_ms,
        cost_usd: run.cost_usd,
    };

    if let Some(dataset_id) = &run.default_dataset_id {
        // A details miss costs only the projection, never the preview.
        let fields = match services.actor_details(actor_name).await {
            Ok(details) => details.display_fields.clone(),
            Err(err) => {
                warn!(actor = %actor_name, error = %err, "actor details unavailable; previewing without projection");
                Vec::new()
            }
        };
        let preview = preview::dataset_preview(
            services.platform.as_ref(),
            dataset_id,
            &fields,
            services.options.preview_char_limit,
        )
        .await?;
        summary.item_count = preview.item_count;
        summary.schema = preview.schema;
        summary.preview = preview.preview;
    }

    let message = match (&summary.dataset_id, summary.item_count) {
        (None, _) => format!("run {} succeeded without a default dataset", summary.run_id),
        (Some(_), 0) => format!("run {} succeeded with an empty dataset", summary.run_id),
        (Some(dataset_id), count) => format!(
            "run {} succeeded with {count} items; read more with get-dataset-items on dataset \
             {dataset_id}",
            summary.run_id
        ),
    };
    let body = serde_json::to_value(&summary)
        .map_err(|err| GantryError::Internal(format!("run summary serialization: {err}")))?;
    Ok(ExecutionResult::succeeded_with_message(body, message))
}
