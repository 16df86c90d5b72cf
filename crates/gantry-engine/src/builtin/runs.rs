// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Run inspection built-in.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use gantry_core::error::GantryError;
use gantry_core::tool::{InternalTool, ToolAnnotations, ToolCall, ToolEntry, ToolKind};
use gantry_core::types::ExecutionResult;

use crate::engine::Services;

use super::parse_args;

pub(crate) fn get_run_entry(services: &Arc<Services>) -> Result<ToolEntry, GantryError> {
    ToolEntry::new(
        "get-run",
        "Fetch the current state of an actor run: status, dataset id, timing, and cost.",
        json!({
            "type": "object",
            "properties": {
                "run_id": { "type": "string" }
            },
            "required": ["run_id"]
        }),
        ToolKind::Internal {
            handler: Arc::new(GetRun {
                services: Arc::clone(services),
            }),
        },
    )
    .map(|entry| entry.with_annotations(ToolAnnotations::read_only()))
}

struct GetRun {
    services: Arc<Services>,
}

#[derive(Deserialize)]
struct GetRunArgs {
    run_id: String,
}

#[async_trait]
impl InternalTool for GetRun {
    async fn run(&self, call: ToolCall) -> Result<ExecutionResult, GantryError> {
        let args: GetRunArgs = parse_args(&call)?;
        let run = self.services.platform.get_run(&args.run_id).await?;

        let message = if run.status.is_terminal() {
            match &run.default_dataset_id {
                Some(dataset_id) => format!(
                    "run {} finished as {}; read its output with get-dataset-items on dataset \
                     {dataset_id}",
                    run.id, run.status
                ),
                None => format!("run {} finished as {}", run.id, run.status),
            }
        } else {
            format!("run {} is {}; poll again for updates", run.id, run.status)
        };

        let body = serde_json::to_value(&run)
            .map_err(|err| GantryError::Internal(format!("run serialization: {err}")))?;
        Ok(ExecutionResult::succeeded_with_message(body, message))
    }
}
