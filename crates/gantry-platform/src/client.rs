// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the actor platform REST API.
//!
//! Provides [`PlatformClient`], which handles request construction,
//! authentication, response envelope parsing, and transient error retry.

use std::time::Duration;

use async_trait::async_trait;
use gantry_core::GantryError;
use gantry_core::traits::PlatformAdapter;
use gantry_core::types::{ActorDetails, ActorSummary, DatasetPage, ItemQuery, Run, RunOptions};
use reqwest::Method;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::wire::{ApiErrorResponse, CatalogPage, Envelope, ToolServerInfo};

/// Base URL for the hosted actor platform.
const API_BASE_URL: &str = "https://api.gantry.dev";

/// HTTP client for platform API communication.
///
/// Manages authentication headers, connection pooling, and retry logic
/// for transient errors (429, 500, 503).
#[derive(Debug, Clone)]
pub struct PlatformClient {
    client: reqwest::Client,
    max_retries: u32,
    base_url: String,
}

impl PlatformClient {
    /// Creates a new platform API client.
    ///
    /// # Arguments
    /// * `token` - platform API token; anonymous access works for catalog
    ///   reads but not for starting runs
    /// * `timeout` - per-request timeout
    pub fn new(token: Option<&str>, timeout: Duration) -> Result<Self, GantryError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = token {
            headers.insert(
                "authorization",
                HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                    GantryError::Config(format!("invalid platform token header value: {e}"))
                })?,
            );
        }
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| GantryError::Platform {
                message: format!("failed to build HTTP client: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            max_retries: 1,
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock, and for
    /// self-hosted platform deployments).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sends a request, unwraps the `data` envelope, and retries once on
    /// transient errors (429, 500, 503) after a 1-second delay.
    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> Result<T, GantryError> {
        let url = format!("{}{}", self.base_url, path);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, path, "retrying platform request after transient error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let mut request = self.client.request(method.clone(), &url);
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await.map_err(|e| GantryError::Platform {
                message: format!("HTTP request failed: {e}"),
                status: None,
                source: Some(Box::new(e)),
            })?;

            let status = response.status();
            debug!(status = %status, attempt, path, "platform response received");

            if status.is_success() {
                let text = response.text().await.map_err(|e| GantryError::Platform {
                    message: format!("failed to read response body: {e}"),
                    status: Some(status.as_u16()),
                    source: Some(Box::new(e)),
                })?;
                let envelope: Envelope<T> =
                    serde_json::from_str(&text).map_err(|e| GantryError::Platform {
                        message: format!("failed to parse platform response: {e}"),
                        status: Some(status.as_u16()),
                        source: Some(Box::new(e)),
                    })?;
                return Ok(envelope.data);
            }

            if is_transient_error(status) && attempt < self.max_retries {
                let text = response.text().await.unwrap_or_default();
                warn!(status = %status, body = %text, "transient platform error, will retry");
                last_error = Some(api_error(status, text));
                continue;
            }

            // Non-transient error or exhausted retries.
            let text = response.text().await.unwrap_or_default();
            return Err(api_error(status, text));
        }

        Err(last_error.unwrap_or_else(|| GantryError::Platform {
            message: "platform request failed after retries".into(),
            status: None,
            source: None,
        }))
    }
}

#[async_trait]
impl PlatformAdapter for PlatformClient {
    async fn search_actors(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ActorSummary>, GantryError> {
        let page: CatalogPage = self
            .request_json(
                Method::GET,
                "/v2/store",
                &[
                    ("search", query.to_string()),
                    ("limit", limit.to_string()),
                    ("offset", offset.to_string()),
                ],
                None,
            )
            .await?;
        Ok(page.items)
    }

    async fn actor_details(&self, actor: &str) -> Result<ActorDetails, GantryError> {
        let path = format!("/v2/acts/{}", actor_path_segment(actor));
        self.request_json(Method::GET, &path, &[], None).await
    }

    async fn tool_server_url(&self, actor_id: &str) -> Result<Option<String>, GantryError> {
        let path = format!("/v2/acts/{}/tool-server", actor_path_segment(actor_id));
        match self
            .request_json::<ToolServerInfo>(Method::GET, &path, &[], None)
            .await
        {
            Ok(info) => Ok(Some(info.url)),
            // 404 means the actor only runs as a batch job.
            Err(GantryError::Platform {
                status: Some(404), ..
            }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn start_run(
        &self,
        actor_id: &str,
        input: Value,
        options: RunOptions,
    ) -> Result<Run, GantryError> {
        let path = format!("/v2/acts/{}/runs", actor_path_segment(actor_id));
        let mut query = Vec::new();
        if let Some(memory) = options.memory_mbytes {
            query.push(("memory_mbytes", memory.to_string()));
        }
        if let Some(timeout) = options.timeout_secs {
            query.push(("timeout_secs", timeout.to_string()));
        }
        self.request_json(Method::POST, &path, &query, Some(&input))
            .await
    }

    async fn get_run(&self, run_id: &str) -> Result<Run, GantryError> {
        let path = format!("/v2/actor-runs/{run_id}");
        self.request_json(Method::GET, &path, &[], None).await
    }

    async fn abort_run(&self, run_id: &str, graceful: bool) -> Result<Run, GantryError> {
        let path = format!("/v2/actor-runs/{run_id}/abort");
        self.request_json(
            Method::POST,
            &path,
            &[("gracefully", graceful.to_string())],
            None,
        )
        .await
    }

    async fn dataset_items(
        &self,
        dataset_id: &str,
        query: ItemQuery,
    ) -> Result<DatasetPage, GantryError> {
        let path = format!("/v2/datasets/{dataset_id}/items");
        self.request_json(
            Method::GET,
            &path,
            &[
                ("offset", query.offset.to_string()),
                ("limit", query.limit.to_string()),
                ("clean", "true".to_string()),
            ],
            None,
        )
        .await
    }
}

/// Full actor names use `owner/actor`; the path form replaces the slash
/// with a tilde so the name stays a single path segment.
fn actor_path_segment(actor: &str) -> String {
    actor.replace('/', "~")
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}

/// Shape a non-2xx response into a [`GantryError::Platform`], preferring
/// the structured error body when the platform sent one.
fn api_error(status: reqwest::StatusCode, body: String) -> GantryError {
    let message = if let Ok(api_err) = serde_json::from_str::<ApiErrorResponse>(&body) {
        format!(
            "platform API error ({}): {}",
            api_err.error.type_, api_err.error.message
        )
    } else {
        format!("platform returned {status}: {body}")
    };
    GantryError::Platform {
        message,
        status: Some(status.as_u16()),
        source: None,
    }
}
