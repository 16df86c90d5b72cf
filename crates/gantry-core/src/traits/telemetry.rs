// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Telemetry adapter trait.

use crate::types::CallEvent;

/// Sink for per-call telemetry events.
///
/// `record` is fire-and-forget: it must not block and must not fail, so it
/// is deliberately synchronous and infallible. Implementations that need
/// I/O hand the event off to a background task.
pub trait TelemetryAdapter: Send + Sync {
    fn record(&self, event: CallEvent);
}

/// Telemetry sink that drops every event. Used when telemetry is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullTelemetry;

impl TelemetryAdapter for NullTelemetry {
    fn record(&self, _event: CallEvent) {}
}
