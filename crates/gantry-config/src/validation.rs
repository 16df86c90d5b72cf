// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as known transport names, valid bind addresses, and
//! limit ranges. Unknown tool categories are not checked here; registration
//! rejects them with the list of known categories.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::GantryConfig;

const KNOWN_TRANSPORTS: [&str; 2] = ["stdio", "http"];
const KNOWN_PAYMENT_MODES: [&str; 2] = ["disabled", "required"];
const KNOWN_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &GantryConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Validate transport is a known name
    if !KNOWN_TRANSPORTS.contains(&config.server.transport.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "server.transport must be one of {}, got `{}`",
                KNOWN_TRANSPORTS.join(", "),
                config.server.transport
            ),
        });
    }

    // Validate bind_address is not empty
    if config.server.bind_address.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.bind_address must not be empty".to_string(),
        });
    }

    // Validate bind_address looks like a valid IP or hostname
    if !config.server.bind_address.trim().is_empty() {
        let addr = config.server.bind_address.trim();
        let is_valid_ip = addr.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = addr
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            errors.push(ConfigError::Validation {
                message: format!(
                    "server.bind_address `{addr}` is not a valid IP address or hostname"
                ),
            });
        }
    }

    if config.server.port == 0 {
        errors.push(ConfigError::Validation {
            message: "server.port must not be 0".to_string(),
        });
    }

    if !KNOWN_LOG_LEVELS.contains(&config.server.log_level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "server.log_level must be one of {}, got `{}`",
                KNOWN_LOG_LEVELS.join(", "),
                config.server.log_level
            ),
        });
    }

    // Validate the platform base URL is an HTTP(S) URL
    let base_url = config.platform.base_url.trim();
    if base_url.is_empty() {
        errors.push(ConfigError::Validation {
            message: "platform.base_url must not be empty".to_string(),
        });
    } else if !base_url.starts_with("https://") && !base_url.starts_with("http://") {
        errors.push(ConfigError::Validation {
            message: format!("platform.base_url must start with http:// or https://, got `{base_url}`"),
        });
    }

    if config.platform.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "platform.timeout_secs must be at least 1".to_string(),
        });
    }

    if !KNOWN_PAYMENT_MODES.contains(&config.tools.payment_mode.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "tools.payment_mode must be one of {}, got `{}`",
                KNOWN_PAYMENT_MODES.join(", "),
                config.tools.payment_mode
            ),
        });
    }

    // Validate category names are non-empty
    for (i, category) in config.tools.categories.iter().enumerate() {
        if category.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("tools.categories[{i}] must not be empty"),
            });
        }
    }

    // Validate no duplicate startup actors
    let mut seen_actors = HashSet::new();
    for actor in &config.tools.actors {
        if actor.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: "tools.actors entries must not be empty".to_string(),
            });
        } else if !seen_actors.insert(actor) {
            errors.push(ConfigError::Validation {
                message: format!("duplicate actor `{actor}` in tools.actors"),
            });
        }
    }

    if config.limits.preview_char_limit == 0 {
        errors.push(ConfigError::Validation {
            message: "limits.preview_char_limit must be at least 1".to_string(),
        });
    }

    if config.limits.poll_interval_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "limits.poll_interval_ms must be at least 1".to_string(),
        });
    }

    if config.limits.max_sync_wait_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "limits.max_sync_wait_secs must be at least 1".to_string(),
        });
    }

    if config.limits.poll_interval_ms > config.limits.max_sync_wait_secs * 1000 {
        errors.push(ConfigError::Validation {
            message: format!(
                "limits.poll_interval_ms ({}) must not exceed limits.max_sync_wait_secs ({}s)",
                config.limits.poll_interval_ms, config.limits.max_sync_wait_secs
            ),
        });
    }

    if config.limits.default_memory_mbytes < 128 {
        errors.push(ConfigError::Validation {
            message: format!(
                "limits.default_memory_mbytes must be at least 128, got {}",
                config.limits.default_memory_mbytes
            ),
        });
    }

    if config.limits.default_task_ttl_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "limits.default_task_ttl_secs must be at least 1".to_string(),
        });
    }

    if config.limits.cache_capacity == 0 {
        errors.push(ConfigError::Validation {
            message: "limits.cache_capacity must be at least 1".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
