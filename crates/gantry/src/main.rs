// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gantry - an MCP server for the Gantry actor platform.
//!
//! This is the binary entry point for the Gantry server.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod serve;
mod show;
mod tools;

/// Gantry - an MCP server for the Gantry actor platform.
#[derive(Parser, Debug)]
#[command(name = "gantry", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the MCP server on the configured transport.
    Serve,
    /// Inspect the tools the current configuration registers.
    Tools {
        #[command(subcommand)]
        command: ToolsCommands,
    },
    /// Manage Gantry configuration.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ToolsCommands {
    /// List registered tools with their kind and description.
    List,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the resolved configuration as TOML.
    Show,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match gantry_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            gantry_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    // A bare `gantry` serves; MCP clients exec the binary with no arguments.
    let result = match cli.command {
        Some(Commands::Serve) | None => serve::run_serve(config).await,
        Some(Commands::Tools {
            command: ToolsCommands::List,
        }) => tools::run_list(config).await,
        Some(Commands::Config {
            command: ConfigCommands::Show,
        }) => {
            show::run_show(&config);
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("gantry: {err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Verify jemalloc is the global allocator by advancing the epoch.
        // Only jemalloc supports this -- the system allocator would fail.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_parses_nested_subcommands() {
        use clap::Parser;
        let cli = super::Cli::parse_from(["gantry", "tools", "list"]);
        assert!(matches!(
            cli.command,
            Some(super::Commands::Tools {
                command: super::ToolsCommands::List
            })
        ));
    }

    #[test]
    fn a_bare_invocation_has_no_subcommand() {
        use clap::Parser;
        let cli = super::Cli::parse_from(["gantry"]);
        assert!(cli.command.is_none());
    }
}
