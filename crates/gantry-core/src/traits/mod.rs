// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for Gantry's external collaborators.
//!
//! The execution engine only sees these traits; the platform REST client,
//! the MCP relay client, and the tracing-based telemetry sink each live in
//! their own crate and plug in here. Tests substitute in-memory fakes.

pub mod platform;
pub mod progress;
pub mod telemetry;
pub mod toolserver;

pub use platform::PlatformAdapter;
pub use progress::ProgressSink;
pub use telemetry::{NullTelemetry, TelemetryAdapter};
pub use toolserver::{RemoteTool, ToolServerAdapter, ToolServerConnection};
