// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./gantry.toml` > `~/.config/gantry/gantry.toml` > `/etc/gantry/gantry.toml`
//! with environment variable overrides via `GANTRY_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::GantryConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/gantry/gantry.toml` (system-wide)
/// 3. `~/.config/gantry/gantry.toml` (user XDG config)
/// 4. `./gantry.toml` (local directory)
/// 5. `GANTRY_*` environment variables
pub fn load_config() -> Result<GantryConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a specific TOML string only (no XDG lookup).
///
/// Used for testing and explicit config file specification.
pub fn load_config_from_str(toml_content: &str) -> Result<GantryConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GantryConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<GantryConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(GantryConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(GantryConfig::default()))
        .merge(Toml::file("/etc/gantry/gantry.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("gantry/gantry.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("gantry.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `GANTRY_SERVER_BIND_ADDRESS`
/// must map to `server.bind_address`, not `server.bind.address`.
fn env_provider() -> Env {
    Env::prefixed("GANTRY_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: GANTRY_PLATFORM_TOKEN -> "platform_token"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("platform_", "platform.", 1)
            .replacen("server_", "server.", 1)
            .replacen("tools_", "tools.", 1)
            .replacen("limits_", "limits.", 1)
            .replacen("telemetry_", "telemetry.", 1);
        mapped.into()
    })
}
