// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Actor platform REST client for Gantry.
//!
//! Implements [`gantry_core::traits::PlatformAdapter`] against the hosted
//! platform API: catalog search, actor resolution, the run lifecycle, and
//! dataset reads.

mod client;
mod wire;

pub use client::PlatformClient;
