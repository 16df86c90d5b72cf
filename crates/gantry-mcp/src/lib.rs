// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! MCP protocol surface.
//!
//! Everything protocol-shaped lives in this crate: the server handler that
//! exposes the engine's registry over MCP, the transports it is served on
//! (stdio and streamable HTTP), and the client adapter the engine uses to
//! reach the tool servers of actors that are themselves MCP servers. No
//! orchestration decisions are made here; requests are converted at the
//! boundary and handed to the engine, results are converted back.

pub mod proxy;
pub mod server;
pub(crate) mod wire;

pub use proxy::RmcpToolServers;
pub use server::{GantryService, serve_http, serve_stdio};
