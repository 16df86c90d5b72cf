// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background task tracking.
//!
//! A task-mode call returns a task id immediately; the work runs on a
//! spawned worker whose lifecycle is recorded here. The tracker owns the
//! per-task state machine (`created` → `working` → terminal) and the
//! cancellation token the worker races against. All transitions go through
//! `get_mut` on one record, so a concurrent cancel and result store cannot
//! interleave: whichever lands second sees a terminal status and yields.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use gantry_core::error::GantryError;
use gantry_core::types::{ExecutionResult, TaskStatus, ToolStatus};

/// Snapshot of a task record, safe to hand to callers.
#[derive(Debug, Clone, Serialize)]
pub struct TaskSnapshot {
    pub task_id: String,
    /// Name of the tool the task is running.
    pub tool_name: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ExecutionResult>,
}

/// Handle returned to the spawning side of a task.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    pub task_id: String,
    pub cancel: CancellationToken,
}

struct TaskRecord {
    tool_name: String,
    status: TaskStatus,
    result: Option<ExecutionResult>,
    ttl: Duration,
    expires_at: Instant,
    cancel: CancellationToken,
}

impl TaskRecord {
    fn snapshot(&self, task_id: &str) -> TaskSnapshot {
        TaskSnapshot {
            task_id: task_id.to_string(),
            tool_name: self.tool_name.clone(),
            status: self.status,
            result: self.result.clone(),
        }
    }

    fn expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// In-memory task store with TTL-based expiry.
pub struct TaskTracker {
    records: DashMap<String, TaskRecord>,
    default_ttl: Duration,
}

impl TaskTracker {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            records: DashMap::new(),
            default_ttl,
        }
    }

    /// Registers a new task in `created` state and returns its handle.
    ///
    /// The TTL counts from now and restarts when a terminal status lands,
    /// so finished results stay pollable for a full retention window.
    pub fn create(&self, tool_name: &str, ttl: Option<Duration>) -> TaskHandle {
        let task_id = Uuid::new_v4().to_string();
        let ttl = ttl.unwrap_or(self.default_ttl);
        let cancel = CancellationToken::new();
        self.records.insert(
            task_id.clone(),
            TaskRecord {
                tool_name: tool_name.to_string(),
                status: TaskStatus::Created,
                result: None,
                ttl,
                expires_at: Instant::now() + ttl,
                cancel: cancel.clone(),
            },
        );
        TaskHandle { task_id, cancel }
    }

    /// Moves a task from `created` to `working`.
    ///
    /// Returns [`GantryError::Cancelled`] when the task was cancelled before
    /// the worker got scheduled, so the worker can stop without running.
    pub fn begin_working(&self, task_id: &str) -> Result<(), GantryError> {
        let mut record = self
            .records
            .get_mut(task_id)
            .ok_or_else(|| GantryError::TaskNotFound {
                task_id: task_id.to_string(),
            })?;
        match record.status {
            TaskStatus::Created => {
                record.status = TaskStatus::Working;
                Ok(())
            }
            TaskStatus::Working => Ok(()),
            TaskStatus::Cancelled => Err(GantryError::Cancelled),
            TaskStatus::Completed | TaskStatus::Failed => Err(GantryError::Internal(format!(
                "task {task_id} already finalized as {}",
                record.status
            ))),
        }
    }

    /// Stores the worker's result, unless the task already reached a
    /// terminal status. Returns whether the result was kept; a dropped
    /// result means a cancel won the race and the caller should discard it.
    pub fn store_result(&self, task_id: &str, result: ExecutionResult) -> bool {
        let Some(mut record) = self.records.get_mut(task_id) else {
            return false;
        };
        if record.status.is_terminal() {
            return false;
        }
        record.status = match result.status {
            ToolStatus::Succeeded | ToolStatus::SoftFail => TaskStatus::Completed,
            ToolStatus::Failed => TaskStatus::Failed,
            ToolStatus::Aborted => TaskStatus::Cancelled,
        };
        record.result = Some(result);
        record.expires_at = Instant::now() + record.ttl;
        true
    }

    /// Cancels a task. Non-terminal tasks move to `cancelled` and their
    /// token fires; terminal tasks are left untouched and their current
    /// snapshot is returned, so repeated cancels are safe.
    pub fn cancel(&self, task_id: &str) -> Result<TaskSnapshot, GantryError> {
        let mut record = self
            .records
            .get_mut(task_id)
            .ok_or_else(|| GantryError::TaskNotFound {
                task_id: task_id.to_string(),
            })?;
        if record.status.is_terminal() {
            return Ok(record.snapshot(task_id));
        }
        record.status = TaskStatus::Cancelled;
        record.expires_at = Instant::now() + record.ttl;
        record.cancel.cancel();
        Ok(record.snapshot(task_id))
    }

    /// Current snapshot of a task. Expired tasks are removed and reported
    /// as not found.
    pub fn get(&self, task_id: &str) -> Result<TaskSnapshot, GantryError> {
        let now = Instant::now();
        let expired = match self.records.get(task_id) {
            Some(record) if record.expired(now) => true,
            Some(record) => return Ok(record.snapshot(task_id)),
            None => false,
        };
        if expired {
            self.records.remove(task_id);
        }
        Err(GantryError::TaskNotFound {
            task_id: task_id.to_string(),
        })
    }

    /// Whether a task has been cancelled. Unknown (or expired and pruned)
    /// tasks count as cancelled so stale workers stand down.
    pub fn is_cancelled(&self, task_id: &str) -> bool {
        self.records
            .get(task_id)
            .map(|record| record.status == TaskStatus::Cancelled)
            .unwrap_or(true)
    }

    /// Drops all expired records and returns how many were removed.
    pub fn prune_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.records.len();
        self.records.retain(|_, record| !record.expired(now));
        before - self.records.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> TaskTracker {
        TaskTracker::new(Duration::from_secs(60))
    }

    #[test]
    fn create_then_get_returns_a_created_snapshot() {
        let tracker = tracker();
        let handle = tracker.create("call-actor", None);

        let snapshot = tracker.get(&handle.task_id).unwrap();
        assert_eq!(snapshot.status, TaskStatus::Created);
        assert_eq!(snapshot.tool_name, "call-actor");
        assert!(snapshot.result.is_none());
    }

    #[test]
    fn begin_working_moves_created_to_working() {
        let tracker = tracker();
        let handle = tracker.create("call-actor", None);

        tracker.begin_working(&handle.task_id).unwrap();
        let snapshot = tracker.get(&handle.task_id).unwrap();
        assert_eq!(snapshot.status, TaskStatus::Working);
    }

    #[test]
    fn store_result_maps_tool_status_to_task_status() {
        let tracker = tracker();

        let ok = tracker.create("a", None);
        assert!(tracker.store_result(&ok.task_id, ExecutionResult::succeeded(serde_json::json!(1))));
        assert_eq!(tracker.get(&ok.task_id).unwrap().status, TaskStatus::Completed);

        let soft = tracker.create("b", None);
        assert!(tracker.store_result(&soft.task_id, ExecutionResult::soft_fail("bad input")));
        assert_eq!(tracker.get(&soft.task_id).unwrap().status, TaskStatus::Completed);

        let failed = tracker.create("c", None);
        assert!(tracker.store_result(&failed.task_id, ExecutionResult::failed("boom")));
        assert_eq!(tracker.get(&failed.task_id).unwrap().status, TaskStatus::Failed);

        let aborted = tracker.create("d", None);
        assert!(tracker.store_result(&aborted.task_id, ExecutionResult::aborted()));
        assert_eq!(tracker.get(&aborted.task_id).unwrap().status, TaskStatus::Cancelled);
    }

    #[test]
    fn cancel_fires_the_token_and_is_idempotent() {
        let tracker = tracker();
        let handle = tracker.create("call-actor", None);

        let first = tracker.cancel(&handle.task_id).unwrap();
        assert_eq!(first.status, TaskStatus::Cancelled);
        assert!(handle.cancel.is_cancelled());

        let second = tracker.cancel(&handle.task_id).unwrap();
        assert_eq!(second.status, TaskStatus::Cancelled);
    }

    #[test]
    fn result_arriving_after_cancel_is_dropped() {
        let tracker = tracker();
        let handle = tracker.create("call-actor", None);
        tracker.begin_working(&handle.task_id).unwrap();
        tracker.cancel(&handle.task_id).unwrap();

        let kept =
            tracker.store_result(&handle.task_id, ExecutionResult::succeeded(serde_json::json!(1)));
        assert!(!kept);

        let snapshot = tracker.get(&handle.task_id).unwrap();
        assert_eq!(snapshot.status, TaskStatus::Cancelled);
        assert!(snapshot.result.is_none());
    }

    #[test]
    fn cancel_after_completion_leaves_the_task_completed() {
        let tracker = tracker();
        let handle = tracker.create("call-actor", None);
        tracker.store_result(&handle.task_id, ExecutionResult::succeeded(serde_json::json!(1)));

        let snapshot = tracker.cancel(&handle.task_id).unwrap();
        assert_eq!(snapshot.status, TaskStatus::Completed);
        assert!(!handle.cancel.is_cancelled());
        assert!(snapshot.result.is_some());
    }

    #[test]
    fn begin_working_on_a_cancelled_task_reports_cancelled() {
        let tracker = tracker();
        let handle = tracker.create("call-actor", None);
        tracker.cancel(&handle.task_id).unwrap();

        let err = tracker.begin_working(&handle.task_id).unwrap_err();
        assert!(matches!(err, GantryError::Cancelled));
    }

    #[test]
    fn expired_tasks_are_not_found_and_pruned() {
        let tracker = tracker();
        let handle = tracker.create("call-actor", Some(Duration::ZERO));

        let err = tracker.get(&handle.task_id).unwrap_err();
        assert!(matches!(err, GantryError::TaskNotFound { .. }));
        assert!(tracker.is_empty());
    }

    #[test]
    fn unknown_tasks_count_as_cancelled() {
        let tracker = tracker();
        assert!(tracker.is_cancelled("no-such-task"));
    }

    #[test]
    fn prune_expired_removes_only_expired_records() {
        let tracker = tracker();
        tracker.create("a", Some(Duration::ZERO));
        let live = tracker.create("b", None);

        assert_eq!(tracker.prune_expired(), 1);
        assert_eq!(tracker.len(), 1);
        assert!(tracker.get(&live.task_id).is_ok());
    }
}
