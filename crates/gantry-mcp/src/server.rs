// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The MCP server handler and the transports it is served on.

use std::net::SocketAddr;
use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParams, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParams,
    ProgressNotificationParam, ProgressToken, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::service::{Peer, RequestContext};
use rmcp::transport::stdio;
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use rmcp::{ErrorData, RoleServer, ServerHandler, ServiceExt};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{debug, info};

use gantry_core::error::GantryError;
use gantry_core::tool::ToolCall;
use gantry_core::traits::ProgressSink;
use gantry_core::types::ProgressUpdate;
use gantry_engine::ExecutionEngine;

use crate::wire;

const INSTRUCTIONS: &str = "Gantry exposes the Gantry actor platform as tools. Start with \
    search-actors to find actors for a job, then fetch-actor-details to inspect an actor's \
    input schema and pricing. add-actor registers an actor as a directly callable tool on \
    this server; call-actor runs one without registering it. Long runs accept a background \
    task request; track and cancel them with get-task and cancel-task, fetch run state with \
    get-run, and page through output with get-dataset-items.";

/// The execution engine, presented as an MCP server.
///
/// The handler owns no state of its own. Tool listings read the live
/// registry, calls are converted at the boundary and handed to the engine,
/// and the engine's result is converted back. Cloning is cheap; the
/// streamable HTTP transport clones one instance per session.
#[derive(Clone)]
pub struct GantryService {
    engine: Arc<ExecutionEngine>,
}

impl GantryService {
    pub fn new(engine: Arc<ExecutionEngine>) -> Self {
        Self { engine }
    }
}

impl ServerHandler for GantryService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_tool_list_changed()
                .build(),
            server_info: Implementation {
                name: "gantry".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            instructions: Some(INSTRUCTIONS.into()),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        let services = self.engine.services();
        let entries = { services.registry.read().await.entries() };
        let prefix = services.options.tool_prefix.as_deref();
        let tools = entries
            .iter()
            .map(|entry| wire::tool_descriptor(entry, prefix))
            .collect();
        Ok(ListToolsResult {
            tools,
            ..Default::default()
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let services = self.engine.services();
        let names_before = { services.registry.read().await.names() };

        let mut call = ToolCall::new(request.name.as_ref(), request.arguments.unwrap_or_default());
        call.meta = wire::call_meta(&context.meta);
        if let Some(token) = context.meta.get_progress_token() {
            call.progress = Some(Arc::new(PeerProgress {
                peer: context.peer.clone(),
                token,
            }));
        }
        call.cancel = context.ct.clone();

        let result = self.engine.execute(call).await;

        // add-actor and remove-actor change what a listing returns, and the
        // protocol wants sessions told about that.
        let names_after = { services.registry.read().await.names() };
        if names_before != names_after
            && let Err(err) = context.peer.notify_tool_list_changed().await
        {
            debug!(error = %err, "tool list change notification not delivered");
        }

        Ok(wire::call_tool_result(result))
    }
}

/// Forwards engine progress to the caller as MCP progress notifications.
///
/// Sends are fire-and-forget from a spawned task; a slow or departed peer
/// must never stall the engine's polling loop.
struct PeerProgress {
    peer: Peer<RoleServer>,
    token: ProgressToken,
}

impl ProgressSink for PeerProgress {
    fn send(&self, update: ProgressUpdate) {
        let peer = self.peer.clone();
        let token = self.token.clone();
        tokio::spawn(async move {
            let notification = ProgressNotificationParam {
                progress_token: token,
                progress: update.progress,
                total: update.total,
                message: update.message,
            };
            if let Err(err) = peer.notify_progress(notification).await {
                debug!(error = %err, "progress notification not delivered");
            }
        });
    }
}

/// Serves the handler over stdio until the client disconnects.
pub async fn serve_stdio(service: GantryService) -> Result<(), GantryError> {
    info!("serving MCP over stdio");
    let running = service
        .serve(stdio())
        .await
        .map_err(|err| GantryError::Internal(format!("starting the stdio transport: {err}")))?;
    running
        .waiting()
        .await
        .map_err(|err| GantryError::Internal(format!("stdio transport task failed: {err}")))?;
    Ok(())
}

/// Serves the handler over streamable HTTP at `/mcp` until `shutdown` fires.
pub async fn serve_http(
    service: GantryService,
    bind: SocketAddr,
    shutdown: CancellationToken,
) -> Result<(), GantryError> {
    let http = StreamableHttpService::new(
        move || Ok(service.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );
    let router = axum::Router::new()
        .nest_service("/mcp", http)
        .layer(CorsLayer::permissive());
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|err| GantryError::Internal(format!("binding {bind}: {err}")))?;
    info!(address = %bind, "serving MCP over streamable HTTP at /mcp");
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|err| GantryError::Internal(format!("HTTP server failed: {err}")))?;
    Ok(())
}
