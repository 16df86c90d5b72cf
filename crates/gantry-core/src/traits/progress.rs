// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Progress notification trait.

use crate::types::ProgressUpdate;

/// Sink for progress updates during a long-running call.
///
/// Created only when the caller supplied a progress token. `send` must not
/// block: the MCP implementation spawns the actual notification, so a slow
/// or dead peer never stalls the run it is watching.
pub trait ProgressSink: Send + Sync {
    fn send(&self, update: ProgressUpdate);
}
