// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The outbound MCP client adapter.
//!
//! Actors that publish a standby tool server speak MCP themselves. The
//! engine reaches them through [`RmcpToolServers`], which dials the
//! server's streamable HTTP endpoint with the caller's credentials and
//! relays the server's progress notifications into the caller's sink.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use rmcp::model::{
    CallToolRequestParams, ClientInfo, Implementation, ProgressNotificationParam,
};
use rmcp::service::{NotificationContext, Peer, RoleClient, RunningService};
use rmcp::transport::StreamableHttpClientTransport;
use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;
use rmcp::{ClientHandler, ServiceExt};
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::debug;

use gantry_core::error::GantryError;
use gantry_core::traits::{ProgressSink, RemoteTool, ToolServerAdapter, ToolServerConnection};
use gantry_core::types::ProgressUpdate;

/// Connects to actor tool servers over MCP streamable HTTP.
#[derive(Clone, Copy, Debug, Default)]
pub struct RmcpToolServers;

impl RmcpToolServers {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ToolServerAdapter for RmcpToolServers {
    async fn connect(
        &self,
        url: &str,
        auth_token: Option<&str>,
        progress: Option<Arc<dyn ProgressSink>>,
    ) -> Result<Box<dyn ToolServerConnection>, GantryError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = auth_token {
            let mut value =
                HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                    GantryError::ToolServer {
                        message: format!("the auth token for {url} is not a valid header value"),
                        source: None,
                    }
                })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| GantryError::ToolServer {
                message: format!("building the HTTP client for {url}: {err}"),
                source: Some(Box::new(err)),
            })?;
        let transport = StreamableHttpClientTransport::with_client(
            client,
            StreamableHttpClientTransportConfig::with_uri(url.to_string()),
        );
        let handler = RelayHandler { progress };
        let running =
            handler
                .serve(transport)
                .await
                .map_err(|err| GantryError::ToolServer {
                    message: format!("connecting to the tool server at {url}: {err}"),
                    source: Some(Box::new(err)),
                })?;
        debug!(%url, "tool server connection established");
        Ok(Box::new(RmcpConnection {
            url: url.to_string(),
            service: Mutex::new(Some(running)),
        }))
    }
}

/// Client-side handler for one tool server session. Its only job is
/// pushing the server's progress notifications into the caller's sink.
#[derive(Clone)]
struct RelayHandler {
    progress: Option<Arc<dyn ProgressSink>>,
}

impl ClientHandler for RelayHandler {
    async fn on_progress(
        &self,
        params: ProgressNotificationParam,
        _context: NotificationContext<RoleClient>,
    ) {
        if let Some(sink) = &self.progress {
            sink.send(ProgressUpdate {
                progress: params.progress,
                total: params.total,
                message: params.message,
            });
        }
    }

    fn get_info(&self) -> ClientInfo {
        ClientInfo {
            client_info: Implementation {
                name: "gantry".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

/// One live session with a tool server.
struct RmcpConnection {
    url: String,
    service: Mutex<Option<RunningService<RoleClient, RelayHandler>>>,
}

impl RmcpConnection {
    /// Clones the session peer out so requests run without holding the
    /// session lock. Fails once the connection has been closed.
    async fn peer(&self) -> Result<Peer<RoleClient>, GantryError> {
        let guard = self.service.lock().await;
        guard
            .as_ref()
            .map(|service| service.peer().clone())
            .ok_or_else(|| GantryError::ToolServer {
                message: format!("the connection to {} is already closed", self.url),
                source: None,
            })
    }

    fn server_error(
        &self,
        doing: &str,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> GantryError {
        GantryError::ToolServer {
            message: format!("{doing} on the tool server at {}: {err}", self.url),
            source: Some(Box::new(err)),
        }
    }
}

#[async_trait]
impl ToolServerConnection for RmcpConnection {
    async fn list_tools(&self) -> Result<Vec<RemoteTool>, GantryError> {
        let peer = self.peer().await?;
        let tools = peer
            .list_all_tools()
            .await
            .map_err(|err| self.server_error("listing tools", err))?;
        Ok(tools
            .into_iter()
            .map(|tool| RemoteTool {
                name: tool.name.to_string(),
                description: tool.description.map(|text| text.to_string()),
                input_schema: Value::Object((*tool.input_schema).clone()),
            })
            .collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<Value, GantryError> {
        let peer = self.peer().await?;
        let result = peer
            .call_tool(CallToolRequestParams {
                meta: None,
                name: name.to_string().into(),
                arguments: Some(arguments),
                task: None,
            })
            .await
            .map_err(|err| self.server_error(&format!("calling tool {name}"), err))?;
        let wire = serde_json::to_value(&result).map_err(|err| {
            GantryError::Internal(format!(
                "serializing the result of tool {name} from {}: {err}",
                self.url
            ))
        })?;
        relay_payload(wire, name, &self.url)
    }

    async fn close(&self) -> Result<(), GantryError> {
        let taken = { self.service.lock().await.take() };
        if let Some(service) = taken {
            service
                .cancel()
                .await
                .map_err(|err| self.server_error("closing the connection", err))?;
            debug!(url = %self.url, "tool server connection closed");
        }
        Ok(())
    }
}

/// Extracts the payload the engine treats as the tool's output from a call
/// result in its wire form. Structured content wins. Otherwise a single
/// text block is parsed as JSON when it is JSON, several become an array
/// of strings, and none at all reads as null.
fn relay_payload(wire: Value, tool: &str, url: &str) -> Result<Value, GantryError> {
    let is_error = wire
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let texts: Vec<String> = wire
        .get("content")
        .and_then(Value::as_array)
        .map(|blocks| {
            blocks
                .iter()
                .filter_map(|block| block.get("text").and_then(Value::as_str))
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();
    if is_error {
        let message = if texts.is_empty() {
            format!("tool {tool} on the server at {url} reported an error")
        } else {
            texts.join("\n")
        };
        return Err(GantryError::ToolServer {
            message,
            source: None,
        });
    }
    if let Some(structured) = wire.get("structuredContent")
        && !structured.is_null()
    {
        return Ok(structured.clone());
    }
    match texts.as_slice() {
        [] => Ok(Value::Null),
        [text] => Ok(serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.clone()))),
        _ => Ok(Value::Array(texts.into_iter().map(Value::String).collect())),
    }
}
