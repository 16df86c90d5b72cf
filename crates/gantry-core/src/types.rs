// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Gantry workspace.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// Outcome status of a single tool call, as reported to the caller.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolStatus {
    /// The tool ran and produced a usable result.
    Succeeded,
    /// The tool could not do what was asked, but the caller can correct the
    /// request and retry (bad arguments, unknown name, missing token).
    SoftFail,
    /// The tool failed for reasons the caller cannot fix by rephrasing.
    Failed,
    /// The call was cancelled before producing a result. Carries no body.
    Aborted,
}

/// Lifecycle state of a background task.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Created,
    Working,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    /// Terminal states never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

/// Whether a tool may, must, or must not run as a background task.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskSupport {
    /// The tool always runs inline; a task request is rejected.
    #[default]
    Forbidden,
    /// The caller chooses inline or task execution.
    Optional,
    /// The tool only runs as a task; a plain call is rejected.
    Required,
}

/// A caller's request to run the call as a background task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRequest {
    /// How long the finished task record stays retrievable, in seconds.
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

/// A progress notification relayed to the caller during a long call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    /// Monotonically increasing progress value.
    pub progress: f64,
    /// Total expected progress, when known.
    #[serde(default)]
    pub total: Option<f64>,
    /// Human-readable status line.
    #[serde(default)]
    pub message: Option<String>,
}

/// Platform-side status of an actor run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Ready,
    Running,
    Succeeded,
    Failed,
    TimedOut,
    Aborting,
    Aborted,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Succeeded | RunStatus::Failed | RunStatus::TimedOut | RunStatus::Aborted
        )
    }
}

/// A single actor run as reported by the platform API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    pub id: String,
    pub actor_id: String,
    pub status: RunStatus,
    /// Platform-provided status line (exit message, abort reason).
    #[serde(default)]
    pub status_message: Option<String>,
    /// Dataset the run writes its output items to.
    #[serde(default)]
    pub default_dataset_id: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub finished_at: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub cost_usd: Option<f64>,
}

/// Options applied when starting an actor run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunOptions {
    #[serde(default)]
    pub memory_mbytes: Option<u32>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// A catalog search hit: enough to decide whether an actor is worth a
/// detail lookup, no more.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorSummary {
    pub id: String,
    /// Full name in `owner/actor` form.
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub pricing: Option<String>,
    #[serde(default)]
    pub total_runs: Option<u64>,
}

/// Full actor record, including the pieces needed to register it as a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorDetails {
    pub id: String,
    /// Full name in `owner/actor` form.
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub readme: Option<String>,
    /// JSON Schema for the actor's input.
    pub input_schema: Value,
    /// Dot paths of the output fields the actor author marked as important.
    #[serde(default)]
    pub display_fields: Vec<String>,
    #[serde(default)]
    pub default_memory_mbytes: Option<u32>,
    #[serde(default)]
    pub default_timeout_secs: Option<u64>,
}

/// Pagination window for dataset item reads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemQuery {
    pub offset: u32,
    pub limit: u32,
}

impl Default for ItemQuery {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 100,
        }
    }
}

/// One page of dataset items plus the dataset's total count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetPage {
    pub items: Vec<Value>,
    pub total: u64,
    pub offset: u32,
    pub limit: u32,
}

/// The terminal result of one tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub status: ToolStatus,
    /// Structured result payload. Always absent for `Aborted`.
    #[serde(default)]
    pub body: Option<Value>,
    /// Caller-facing prose: what happened and what to try next.
    #[serde(default)]
    pub message: Option<String>,
}

impl ExecutionResult {
    pub fn succeeded(body: Value) -> Self {
        Self {
            status: ToolStatus::Succeeded,
            body: Some(body),
            message: None,
        }
    }

    pub fn succeeded_with_message(body: Value, message: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Succeeded,
            body: Some(body),
            message: Some(message.into()),
        }
    }

    pub fn soft_fail(message: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::SoftFail,
            body: None,
            message: Some(message.into()),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Failed,
            body: None,
            message: Some(message.into()),
        }
    }

    /// An aborted call reports no body, only the status.
    pub fn aborted() -> Self {
        Self {
            status: ToolStatus::Aborted,
            body: None,
            message: None,
        }
    }
}

/// Summary of a finished actor run, returned as the body of a remote-job call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    /// Full actor name the run belongs to.
    pub actor: String,
    pub status: RunStatus,
    #[serde(default)]
    pub dataset_id: Option<String>,
    /// Total items in the dataset, not just the previewed ones.
    pub item_count: u64,
    /// Inferred item schema, when any items exist.
    #[serde(default)]
    pub schema: Option<Value>,
    /// Size-bounded sample of the output items.
    pub preview: Vec<Value>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub cost_usd: Option<f64>,
}

/// One telemetry record per finished tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEvent {
    pub tool_name: String,
    pub status: ToolStatus,
    pub duration_ms: u64,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Per-call metadata extracted from the protocol envelope.
#[derive(Clone, Default)]
pub struct CallMeta {
    /// Caller's platform API token, used for upstream connections made on
    /// the caller's behalf. Never logged.
    pub auth_token: Option<String>,
    pub session_id: Option<String>,
    /// Actor ids the caller has already paid for in rental pricing models.
    pub rented_actor_ids: Vec<String>,
    /// Present when the caller asked for background-task execution.
    pub task: Option<TaskRequest>,
}

impl std::fmt::Debug for CallMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallMeta")
            .field("auth_token", &self.auth_token.as_ref().map(|_| "***"))
            .field("session_id", &self.session_id)
            .field("rented_actor_ids", &self.rented_actor_ids)
            .field("task", &self.task)
            .finish()
    }
}
