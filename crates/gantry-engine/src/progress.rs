// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Polling loop for in-flight actor runs.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use gantry_core::error::GantryError;
use gantry_core::traits::{PlatformAdapter, ProgressSink};
use gantry_core::types::{ProgressUpdate, Run};

/// How a wait on a run ended.
#[derive(Debug)]
pub enum RunWait {
    /// The run reached a terminal status.
    Finished(Run),
    /// The wait deadline passed with the run still going; carries the last
    /// observed snapshot.
    DeadlineExceeded(Run),
    /// The caller cancelled while the run was still going.
    Cancelled,
}

/// Polls a run until it finishes, the caller cancels, or a deadline passes.
pub struct RunPoller {
    interval: Duration,
}

impl RunPoller {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Waits for `run_id` to reach a terminal status.
    ///
    /// Each poll emits one progress update through `progress` when a sink is
    /// attached. Cancellation is observed between polls, never mid-request,
    /// so the final platform state is always coherent.
    pub async fn await_finish(
        &self,
        platform: &dyn PlatformAdapter,
        run_id: &str,
        progress: Option<&Arc<dyn ProgressSink>>,
        cancel: &CancellationToken,
        deadline: Option<Duration>,
    ) -> Result<RunWait, GantryError> {
        let started = Instant::now();
        let mut polls: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                return Ok(RunWait::Cancelled);
            }

            let run = platform.get_run(run_id).await?;
            polls += 1;
            debug!(run_id, status = %run.status, polls, "polled run");

            if let Some(sink) = progress {
                sink.send(ProgressUpdate {
                    progress: polls as f64,
                    total: None,
                    message: Some(format!(
                        "run {} is {} ({}s elapsed)",
                        run.id,
                        run.status,
                        started.elapsed().as_secs()
                    )),
                });
            }

            if run.status.is_terminal() {
                return Ok(RunWait::Finished(run));
            }
            if let Some(limit) = deadline
                && started.elapsed() >= limit
            {
                return Ok(RunWait::DeadlineExceeded(run));
            }

            tokio::select! {
                _ = cancel.cancelled() => return Ok(RunWait::Cancelled),
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }
}
