// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire envelope types for the platform REST API.

use serde::Deserialize;

use gantry_core::types::ActorSummary;

/// Every platform response wraps its payload in a `data` envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: T,
}

/// Catalog search response payload.
#[derive(Debug, Deserialize)]
pub(crate) struct CatalogPage {
    pub items: Vec<ActorSummary>,
}

/// Payload of the tool-server probe endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct ToolServerInfo {
    pub url: String,
}

/// Error body returned by the platform on non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    #[serde(rename = "type")]
    pub type_: String,
    pub message: String,
}
