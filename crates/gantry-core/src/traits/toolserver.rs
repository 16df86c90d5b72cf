// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits for actor-hosted tool servers.
//!
//! Some actors do not run as batch jobs; they host their own tool server
//! and Gantry relays calls to them. The adapter opens connections, the
//! connection lists and calls tools. Connections are single-use: the engine
//! closes them after every operation, success or failure.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::GantryError;
use crate::traits::progress::ProgressSink;

/// A tool as described by an origin server, before Gantry prefixes it.
#[derive(Debug, Clone)]
pub struct RemoteTool {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
}

/// An open connection to one tool server.
#[async_trait]
pub trait ToolServerConnection: Send + Sync {
    async fn list_tools(&self) -> Result<Vec<RemoteTool>, GantryError>;

    /// Call a tool by its origin name and return the structured result.
    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<Value, GantryError>;

    /// Tear the connection down. Must be safe to call after a failed
    /// operation; implementors tolerate double-close.
    async fn close(&self) -> Result<(), GantryError>;
}

/// Factory for tool server connections.
#[async_trait]
pub trait ToolServerAdapter: Send + Sync {
    /// Connect to a tool server, authenticating with the caller's token
    /// when one is supplied. Progress notifications from the origin server
    /// are forwarded to `progress` for the lifetime of the connection.
    async fn connect(
        &self,
        url: &str,
        auth_token: Option<&str>,
        progress: Option<Arc<dyn ProgressSink>>,
    ) -> Result<Box<dyn ToolServerConnection>, GantryError>;
}
