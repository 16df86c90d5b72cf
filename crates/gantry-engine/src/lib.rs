// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool execution engine.
//!
//! This crate turns protocol-level tool calls into results: it resolves
//! names against the registry, validates and repairs arguments, dispatches
//! to internal handlers, platform runs, or proxied tool servers, and folds
//! every failure into a status the caller can act on. It also owns the
//! built-in tool set and the background task machinery.

pub mod builtin;
pub mod engine;
pub mod normalize;
pub mod preview;
pub mod progress;
pub(crate) mod remote;
pub mod tasks;
pub mod telemetry;

pub use engine::{EngineOptions, ExecutionEngine, Services};
pub use tasks::{TaskSnapshot, TaskTracker};
pub use telemetry::LogTelemetry;
