// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recording sinks for the synchronous observer traits.
//!
//! Telemetry and progress sinks are called from async contexts but are
//! synchronous by contract, so these recorders use a std mutex held only
//! for the push.

use std::sync::Mutex;

use gantry_core::traits::{ProgressSink, TelemetryAdapter};
use gantry_core::types::{CallEvent, ProgressUpdate};

/// Captures every telemetry event for later assertions.
#[derive(Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<CallEvent>>,
}

impl RecordingTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CallEvent> {
        self.events.lock().expect("telemetry mutex poisoned").clone()
    }
}

impl TelemetryAdapter for RecordingTelemetry {
    fn record(&self, event: CallEvent) {
        self.events
            .lock()
            .expect("telemetry mutex poisoned")
            .push(event);
    }
}

/// Captures progress updates relayed during a call.
#[derive(Default)]
pub struct RecordingProgress {
    updates: Mutex<Vec<ProgressUpdate>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<ProgressUpdate> {
        self.updates.lock().expect("progress mutex poisoned").clone()
    }
}

impl ProgressSink for RecordingProgress {
    fn send(&self, update: ProgressUpdate) {
        self.updates
            .lock()
            .expect("progress mutex poisoned")
            .push(update);
    }
}
