// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Actor platform adapter trait.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::GantryError;
use crate::types::{ActorDetails, ActorSummary, DatasetPage, ItemQuery, Run, RunOptions};

/// Adapter for the actor platform's REST API.
///
/// This is the narrow seam between orchestration and the platform: catalog
/// search, actor resolution, the run lifecycle, and dataset reads. One
/// implementation wraps the real HTTP API; tests use a scripted fake.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// Full-text search over the actor catalog.
    async fn search_actors(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ActorSummary>, GantryError>;

    /// Resolve an actor by id or full `owner/actor` name.
    async fn actor_details(&self, actor: &str) -> Result<ActorDetails, GantryError>;

    /// Probe whether an actor hosts its own tool server.
    ///
    /// Returns the server URL when it does, `None` when the actor only runs
    /// as a batch job. Callers are expected to memoize both outcomes.
    async fn tool_server_url(&self, actor_id: &str) -> Result<Option<String>, GantryError>;

    /// Start an actor run with the given input.
    async fn start_run(
        &self,
        actor_id: &str,
        input: Value,
        options: RunOptions,
    ) -> Result<Run, GantryError>;

    /// Fetch the current state of a run.
    async fn get_run(&self, run_id: &str) -> Result<Run, GantryError>;

    /// Abort a run. Non-graceful aborts stop the actor immediately;
    /// graceful ones let it checkpoint first.
    async fn abort_run(&self, run_id: &str, graceful: bool) -> Result<Run, GantryError>;

    /// Read a page of items from a dataset.
    async fn dataset_items(
        &self,
        dataset_id: &str,
        query: ItemQuery,
    ) -> Result<DatasetPage, GantryError>;
}
