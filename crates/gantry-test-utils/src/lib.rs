// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted adapter fakes and fixtures shared across Gantry tests.
//!
//! Everything here implements the adapter traits from `gantry-core`
//! against in-memory state, with call recording for assertions. No fake
//! talks to a network.

pub mod platform;
pub mod recording;
pub mod toolserver;

pub use platform::{
    AbortCall, MockPlatform, RunScript, StartedRun, actor_details_fixture, actor_summary_fixture,
};
pub use recording::{RecordingProgress, RecordingTelemetry};
pub use toolserver::{MockToolServers, RecordedCall, RecordedConnect, remote_tool_fixture};
