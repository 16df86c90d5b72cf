// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The tools list command.

use gantry_config::model::GantryConfig;
use gantry_core::error::GantryError;
use gantry_engine::builtin;

use crate::serve::build_services;

/// Prints the tools the configured categories register, one per line.
///
/// Actors listed under `tools.actors` are resolved against the platform at
/// serve time; here they are reported by name only, without a network
/// round trip.
pub async fn run_list(config: GantryConfig) -> Result<(), GantryError> {
    let services = build_services(&config)?;
    builtin::register_categories(&services, &config.tools.categories).await?;

    let registry = services.registry.read().await;
    for entry in registry.entries() {
        println!(
            "{:<22} {:<12} {}",
            entry.name,
            entry.kind.tag(),
            entry.description
        );
    }
    drop(registry);

    if !config.tools.actors.is_empty() {
        println!();
        println!("configured actors (registered at serve time):");
        for actor in &config.tools.actors {
            println!("  {actor}");
        }
    }
    Ok(())
}
