// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telemetry sink that emits call events as structured log lines.

use tracing::info;

use gantry_core::traits::TelemetryAdapter;
use gantry_core::types::CallEvent;

/// Records every finished call as an `info` event. The default sink when
/// telemetry is enabled without an external collector.
pub struct LogTelemetry;

impl TelemetryAdapter for LogTelemetry {
    fn record(&self, event: CallEvent) {
        info!(
            tool = %event.tool_name,
            status = %event.status,
            duration_ms = event.duration_ms,
            session_id = event.session_id.as_deref().unwrap_or("-"),
            "tool call finished"
        );
    }
}
