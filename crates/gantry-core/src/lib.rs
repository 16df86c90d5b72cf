// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Gantry orchestration server.
//!
//! This crate provides the tool model (entries, kinds, the registry), the
//! adapter traits for external collaborators, the shared error type, and
//! the output-bounding logic. It performs no I/O of its own; everything
//! here is exercised by the execution engine and the protocol surface.

pub mod bound;
pub mod error;
pub mod registry;
pub mod tool;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::GantryError;
pub use registry::{PaymentMode, ToolRegistry};
pub use tool::{
    InternalTool, ToolAnnotations, ToolCall, ToolEntry, ToolKind, ToolKindTag,
};
pub use types::{
    CallEvent, CallMeta, ExecutionResult, ProgressUpdate, RunStatus, TaskRequest, TaskStatus,
    TaskSupport, ToolStatus,
};

// Re-export all adapter traits at crate root.
pub use traits::{
    PlatformAdapter, ProgressSink, TelemetryAdapter, ToolServerAdapter, ToolServerConnection,
};
