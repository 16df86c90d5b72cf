// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Gantry orchestration server.

use thiserror::Error;

use crate::types::ToolStatus;

/// The primary error type used across all Gantry adapter traits and core operations.
#[derive(Debug, Error)]
pub enum GantryError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Actor platform API errors (HTTP failure, bad response, quota exceeded).
    #[error("platform error: {message}")]
    Platform {
        message: String,
        /// HTTP status of the failed request, when one was received.
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Errors talking to an actor-hosted tool server (connect, list, call, close).
    #[error("tool server error: {message}")]
    ToolServer {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The requested tool is not registered for this session.
    #[error("unknown tool: {name}")]
    ToolNotFound {
        name: String,
        /// Names currently registered, for the caller-facing hint.
        available: Vec<String>,
    },

    /// The call arguments were rejected by the tool's input schema or by a
    /// pre-dispatch check.
    #[error("invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    /// A payment-gated tool was called without the payment token argument.
    #[error("payment token required for {tool}")]
    MissingPaymentToken { tool: String },

    /// The referenced task does not exist or has expired.
    #[error("task not found: {task_id}")]
    TaskNotFound { task_id: String },

    /// The call was cancelled before it produced a result.
    #[error("operation cancelled")]
    Cancelled,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GantryError {
    /// Map an error to the [`ToolStatus`] reported to the caller.
    ///
    /// Caller-correctable conditions (bad arguments, unknown names, missing
    /// tokens, platform 4xx) are soft failures. Platform 5xx, transport
    /// errors, and anything unclassified are hard failures. Cancellation is
    /// the one path that yields `Aborted`.
    pub fn tool_status(&self) -> ToolStatus {
        match self {
            GantryError::Cancelled => ToolStatus::Aborted,
            GantryError::ToolNotFound { .. }
            | GantryError::InvalidArguments { .. }
            | GantryError::MissingPaymentToken { .. }
            | GantryError::TaskNotFound { .. } => ToolStatus::SoftFail,
            GantryError::Platform {
                status: Some(code), ..
            } if (400..500).contains(code) => ToolStatus::SoftFail,
            _ => ToolStatus::Failed,
        }
    }
}
