// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted tool-server fake.
//!
//! Connections share state with the adapter, so tests can assert on
//! connects, relayed calls, and close counts after the connection itself
//! has been dropped. The close counter is the load-bearing part: the
//! engine promises one close per connect on every path.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tokio::sync::Mutex;

use gantry_core::error::GantryError;
use gantry_core::traits::{ProgressSink, RemoteTool, ToolServerAdapter, ToolServerConnection};
use gantry_core::types::ProgressUpdate;

/// Record of one `connect` call.
#[derive(Debug, Clone)]
pub struct RecordedConnect {
    pub url: String,
    pub auth_token: Option<String>,
}

/// Record of one relayed `call_tool`.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub name: String,
    pub arguments: Map<String, Value>,
}

#[derive(Default)]
struct ServerShared {
    tools: Mutex<Vec<RemoteTool>>,
    call_results: Mutex<VecDeque<Result<Value, String>>>,
    progress_script: Mutex<Vec<ProgressUpdate>>,
    calls: Mutex<Vec<RecordedCall>>,
    connects: Mutex<Vec<RecordedConnect>>,
    closes: AtomicUsize,
    connect_error: Mutex<Option<String>>,
    list_error: Mutex<Option<String>>,
}

/// Tool-server adapter fake serving one scripted server.
#[derive(Default)]
pub struct MockToolServers {
    shared: Arc<ServerShared>,
}

impl MockToolServers {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fake whose connections list the given tools.
    pub fn with_tools(tools: Vec<RemoteTool>) -> Self {
        let fake = Self::default();
        *fake.shared.tools.try_lock().expect("fresh mock is uncontended") = tools;
        fake
    }

    /// Queues the result of the next relayed call. With an empty queue,
    /// calls answer `{"ok": true}`.
    pub async fn push_call_result(&self, value: Value) {
        self.shared.call_results.lock().await.push_back(Ok(value));
    }

    pub async fn push_call_error(&self, message: &str) {
        self.shared
            .call_results
            .lock()
            .await
            .push_back(Err(message.to_string()));
    }

    /// Queues a progress update the next relayed call pushes through the
    /// sink its connection was opened with.
    pub async fn push_progress_update(&self, update: ProgressUpdate) {
        self.shared.progress_script.lock().await.push(update);
    }

    /// Makes every subsequent connect fail.
    pub async fn set_connect_error(&self, message: &str) {
        *self.shared.connect_error.lock().await = Some(message.to_string());
    }

    /// Makes `list_tools` fail on otherwise healthy connections.
    pub async fn set_list_error(&self, message: &str) {
        *self.shared.list_error.lock().await = Some(message.to_string());
    }

    pub async fn connects(&self) -> Vec<RecordedConnect> {
        self.shared.connects.lock().await.clone()
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.shared.calls.lock().await.clone()
    }

    pub fn close_count(&self) -> usize {
        self.shared.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolServerAdapter for MockToolServers {
    async fn connect(
        &self,
        url: &str,
        auth_token: Option<&str>,
        progress: Option<Arc<dyn ProgressSink>>,
    ) -> Result<Box<dyn ToolServerConnection>, GantryError> {
        self.shared.connects.lock().await.push(RecordedConnect {
            url: url.to_string(),
            auth_token: auth_token.map(str::to_string),
        });
        if let Some(message) = self.shared.connect_error.lock().await.clone() {
            return Err(GantryError::ToolServer {
                message,
                source: None,
            });
        }
        Ok(Box::new(MockConnection {
            shared: Arc::clone(&self.shared),
            progress,
        }))
    }
}

struct MockConnection {
    shared: Arc<ServerShared>,
    progress: Option<Arc<dyn ProgressSink>>,
}

#[async_trait]
impl ToolServerConnection for MockConnection {
    async fn list_tools(&self) -> Result<Vec<RemoteTool>, GantryError> {
        if let Some(message) = self.shared.list_error.lock().await.clone() {
            return Err(GantryError::ToolServer {
                message,
                source: None,
            });
        }
        Ok(self.shared.tools.lock().await.clone())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<Value, GantryError> {
        self.shared.calls.lock().await.push(RecordedCall {
            name: name.to_string(),
            arguments,
        });
        if let Some(sink) = &self.progress {
            for update in self.shared.progress_script.lock().await.drain(..) {
                sink.send(update);
            }
        }
        match self.shared.call_results.lock().await.pop_front() {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(GantryError::ToolServer {
                message,
                source: None,
            }),
            None => Ok(json!({ "ok": true })),
        }
    }

    async fn close(&self) -> Result<(), GantryError> {
        self.shared.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Minimal remote tool description for tests.
pub fn remote_tool_fixture(name: &str) -> RemoteTool {
    RemoteTool {
        name: name.to_string(),
        description: Some(format!("Test tool {name}.")),
        input_schema: json!({ "type": "object" }),
    }
}
