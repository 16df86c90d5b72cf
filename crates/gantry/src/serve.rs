// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The serve command: wires the engine together and runs the MCP server.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use gantry_config::model::GantryConfig;
use gantry_core::error::GantryError;
use gantry_core::traits::{NullTelemetry, PlatformAdapter, TelemetryAdapter, ToolServerAdapter};
use gantry_engine::builtin;
use gantry_engine::builtin::actors::{RegisterOutcome, register_actor};
use gantry_engine::{EngineOptions, ExecutionEngine, LogTelemetry, Services};
use gantry_mcp::{GantryService, RmcpToolServers, serve_http, serve_stdio};
use gantry_platform::PlatformClient;

/// Runs the server until the transport finishes or a shutdown signal
/// arrives.
pub async fn run_serve(config: GantryConfig) -> Result<(), GantryError> {
    init_tracing(&config.server.log_level);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        transport = %config.server.transport,
        "starting gantry"
    );

    let services = build_services(&config)?;

    let count = builtin::register_categories(&services, &config.tools.categories).await?;
    info!(
        count,
        categories = ?config.tools.categories,
        "built-in tools registered"
    );

    for actor in &config.tools.actors {
        let (details, outcome) = register_actor(&services, actor, None).await?;
        match outcome {
            RegisterOutcome::Job { tool, .. } => {
                info!(actor = %details.name, %tool, "configured actor registered as a job tool");
            }
            RegisterOutcome::Server { tools } => {
                info!(
                    actor = %details.name,
                    count = tools.len(),
                    "configured actor registered from its tool server"
                );
            }
        }
    }

    let telemetry: Arc<dyn TelemetryAdapter> = if config.telemetry.enabled {
        Arc::new(LogTelemetry)
    } else {
        Arc::new(NullTelemetry)
    };
    let engine = Arc::new(ExecutionEngine::new(services, telemetry));
    let service = GantryService::new(engine);

    let shutdown = install_signal_handler();
    if config.server.transport == "http" {
        serve_http(service, bind_address(&config)?, shutdown).await?;
    } else {
        // Validation pins the transport to stdio or http.
        tokio::select! {
            result = serve_stdio(service) => result?,
            () = shutdown.cancelled() => {
                info!("shutdown signal received");
            }
        }
    }

    info!("shutdown complete");
    Ok(())
}

/// Builds the shared service state from configuration.
pub fn build_services(config: &GantryConfig) -> Result<Arc<Services>, GantryError> {
    let platform = PlatformClient::new(
        config.platform.token.as_deref(),
        Duration::from_secs(config.platform.timeout_secs),
    )?
    .with_base_url(config.platform.base_url.clone());
    let platform: Arc<dyn PlatformAdapter> = Arc::new(platform);
    let tool_servers: Arc<dyn ToolServerAdapter> = Arc::new(RmcpToolServers::new());
    Ok(Services::new(platform, tool_servers, engine_options(config)))
}

fn engine_options(config: &GantryConfig) -> EngineOptions {
    EngineOptions {
        preview_char_limit: config.limits.preview_char_limit,
        poll_interval: Duration::from_millis(config.limits.poll_interval_ms),
        max_sync_wait: Duration::from_secs(config.limits.max_sync_wait_secs),
        default_memory_mbytes: config.limits.default_memory_mbytes,
        default_timeout_secs: config.limits.default_timeout_secs,
        default_task_ttl: Duration::from_secs(config.limits.default_task_ttl_secs),
        cache_capacity: config.limits.cache_capacity,
        cache_ttl: Duration::from_secs(config.limits.cache_ttl_secs),
        force_async: config.server.force_async,
        tool_prefix: config.server.name_prefix.clone(),
        payment: config.tools.payment_mode(),
        enable_mutation: config.tools.enable_mutation,
    }
}

fn bind_address(config: &GantryConfig) -> Result<SocketAddr, GantryError> {
    let ip: IpAddr = config.server.bind_address.parse().map_err(|_| {
        GantryError::Config(format!(
            "server.bind_address is not an IP address: {}",
            config.server.bind_address
        ))
    })?;
    Ok(SocketAddr::new(ip, config.server.port))
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr; on the stdio transport stdout belongs to the
/// protocol.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "gantry={log_level},gantry_core={log_level},gantry_engine={log_level},\
             gantry_platform={log_level},gantry_mcp={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Installs signal handlers for SIGTERM and SIGINT.
///
/// Returns a [`CancellationToken`] that is cancelled when either signal is
/// received. The handler task runs in the background until then.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

            tokio::select! {
                _ = ctrl_c => {
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
                _ = sigterm.recv() => {
                    info!("received SIGTERM, initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}
