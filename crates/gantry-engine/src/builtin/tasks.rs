// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Task management built-ins.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use gantry_core::error::GantryError;
use gantry_core::tool::{InternalTool, ToolAnnotations, ToolCall, ToolEntry, ToolKind};
use gantry_core::types::{ExecutionResult, TaskStatus};

use crate::engine::Services;
use crate::tasks::TaskSnapshot;

use super::parse_args;

pub(crate) fn get_task_entry(services: &Arc<Services>) -> Result<ToolEntry, GantryError> {
    ToolEntry::new(
        "get-task",
        "Poll a background task by id. Completed tasks include the tool's result.",
        json!({
            "type": "object",
            "properties": {
                "task_id": { "type": "string" }
            },
            "required": ["task_id"]
        }),
        ToolKind::Internal {
            handler: Arc::new(GetTask {
                services: Arc::clone(services),
            }),
        },
    )
    .map(|entry| entry.with_annotations(ToolAnnotations::read_only()))
}

pub(crate) fn cancel_task_entry(services: &Arc<Services>) -> Result<ToolEntry, GantryError> {
    ToolEntry::new(
        "cancel-task",
        "Cancel a background task. Cancelling a finished task changes nothing and reports \
         its final state.",
        json!({
            "type": "object",
            "properties": {
                "task_id": { "type": "string" }
            },
            "required": ["task_id"]
        }),
        ToolKind::Internal {
            handler: Arc::new(CancelTask {
                services: Arc::clone(services),
            }),
        },
    )
}

fn snapshot_body(snapshot: &TaskSnapshot) -> Result<serde_json::Value, GantryError> {
    serde_json::to_value(snapshot)
        .map_err(|err| GantryError::Internal(format!("task snapshot serialization: {err}")))
}

struct GetTask {
    services: Arc<Services>,
}

#[derive(Deserialize)]
struct TaskArgs {
    task_id: String,
}

#[async_trait]
impl InternalTool for GetTask {
    async fn run(&self, call: ToolCall) -> Result<ExecutionResult, GantryError> {
        let args: TaskArgs = parse_args(&call)?;
        let snapshot = self.services.tracker.get(&args.task_id)?;

        let message = match snapshot.status {
            TaskStatus::Created | TaskStatus::Working => format!(
                "task {} is {}; poll again or stop it with cancel-task",
                snapshot.task_id, snapshot.status
            ),
            TaskStatus::Completed => {
                format!("task {} completed; the result is included", snapshot.task_id)
            }
            TaskStatus::Failed => format!(
                "task {} failed; the failure result is included",
                snapshot.task_id
            ),
            TaskStatus::Cancelled => format!("task {} was cancelled", snapshot.task_id),
        };

        Ok(ExecutionResult::succeeded_with_message(
            snapshot_body(&snapshot)?,
            message,
        ))
    }
}

struct CancelTask {
    services: Arc<Services>,
}

#[async_trait]
impl InternalTool for CancelTask {
    async fn run(&self, call: ToolCall) -> Result<ExecutionResult, GantryError> {
        let args: TaskArgs = parse_args(&call)?;

        let before = self.services.tracker.get(&args.task_id)?;
        let snapshot = self.services.tracker.cancel(&args.task_id)?;

        let message = if before.status.is_terminal() {
            format!(
                "task {} had already finished as {}; nothing to cancel",
                snapshot.task_id, snapshot.status
            )
        } else {
            format!("task {} is now cancelled", snapshot.task_id)
        };

        Ok(ExecutionResult::succeeded_with_message(
            snapshot_body(&snapshot)?,
            message,
        ))
    }
}
