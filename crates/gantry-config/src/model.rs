// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Gantry server.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

use gantry_core::registry::PaymentMode;

/// Top-level Gantry configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GantryConfig {
    /// Actor platform API settings.
    #[serde(default)]
    pub platform: PlatformConfig,

    /// MCP server transport and identity settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Tool registration settings.
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Runtime limits and cache sizing.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Telemetry settings.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Actor platform API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformConfig {
    /// Platform API token. `None` requires the environment variable.
    #[serde(default)]
    pub token: Option<String>,

    /// Base URL of the platform REST API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_platform_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            token: None,
            base_url: default_base_url(),
            timeout_secs: default_platform_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.gantry.dev".to_string()
}

fn default_platform_timeout_secs() -> u64 {
    30
}

/// MCP server transport and identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Transport to serve on: "stdio" or "http".
    #[serde(default = "default_transport")]
    pub transport: String,

    /// Address to bind the HTTP transport to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Port for the HTTP transport.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Start every remote job detached instead of waiting for it inline.
    #[serde(default)]
    pub force_async: bool,

    /// Prefix stripped from incoming tool names, for clients that namespace
    /// the tools they re-export.
    #[serde(default)]
    pub name_prefix: Option<String>,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: default_transport(),
            bind_address: default_bind_address(),
            port: default_port(),
            force_async: false,
            name_prefix: None,
            log_level: default_log_level(),
        }
    }
}

fn default_transport() -> String {
    "stdio".to_string()
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Tool registration configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    /// Built-in tool categories to register at startup.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,

    /// Actors registered as tools at startup, by id or owner/actor name.
    #[serde(default)]
    pub actors: Vec<String>,

    /// Whether add-actor and remove-actor are registered at all.
    #[serde(default = "default_enable_mutation")]
    pub enable_mutation: bool,

    /// Payment gating mode: "disabled" or "required".
    #[serde(default = "default_payment_mode")]
    pub payment_mode: String,
}

impl ToolsConfig {
    /// Parsed payment mode. Unknown values are caught by validation; this
    /// falls back to disabled so callers after validation need no error path.
    pub fn payment_mode(&self) -> PaymentMode {
        match self.payment_mode.as_str() {
            "required" => PaymentMode::Required,
            _ => PaymentMode::Disabled,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            actors: Vec::new(),
            enable_mutation: default_enable_mutation(),
            payment_mode: default_payment_mode(),
        }
    }
}

fn default_categories() -> Vec<String> {
    vec!["default".to_string()]
}

fn default_enable_mutation() -> bool {
    true
}

fn default_payment_mode() -> String {
    "disabled".to_string()
}

/// Runtime limits and cache sizing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// Character budget for dataset previews and item reads.
    #[serde(default = "default_preview_char_limit")]
    pub preview_char_limit: usize,

    /// Delay between run status polls in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Longest a synchronous call waits for a run before handing back a
    /// pointer to it, in seconds.
    #[serde(default = "default_max_sync_wait_secs")]
    pub max_sync_wait_secs: u64,

    /// Memory in megabytes for runs whose actor declares no default.
    #[serde(default = "default_memory_mbytes")]
    pub default_memory_mbytes: u32,

    /// Timeout in seconds for runs whose actor declares no default.
    /// `None` leaves the platform's own default in force.
    #[serde(default)]
    pub default_timeout_secs: Option<u64>,

    /// Retention in seconds for task records whose request named no TTL.
    #[serde(default = "default_task_ttl_secs")]
    pub default_task_ttl_secs: u64,

    /// Entry budget for the actor details and discovery caches.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Lifetime in seconds of cached details and discovery results.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            preview_char_limit: default_preview_char_limit(),
            poll_interval_ms: default_poll_interval_ms(),
            max_sync_wait_secs: default_max_sync_wait_secs(),
            default_memory_mbytes: default_memory_mbytes(),
            default_timeout_secs: None,
            default_task_ttl_secs: default_task_ttl_secs(),
            cache_capacity: default_cache_capacity(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

fn default_preview_char_limit() -> usize {
    25_000
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

fn default_max_sync_wait_secs() -> u64 {
    300
}

fn default_memory_mbytes() -> u32 {
    1024
}

fn default_task_ttl_secs() -> u64 {
    600
}

fn default_cache_capacity() -> usize {
    128
}

fn default_cache_ttl_secs() -> u64 {
    300
}

/// Telemetry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Emit one structured log event per tool call.
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
        }
    }
}

fn default_telemetry_enabled() -> bool {
    true
}
