// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted platform fake.
//!
//! [`MockPlatform`] answers the platform adapter trait from in-memory
//! state: a catalog, actor records, run scripts, and datasets. Runs are
//! driven by [`RunScript`]s that decide how many polls a run stays
//! `RUNNING` before reporting its terminal status, which lets tests
//! exercise the poll loop, sync-wait caps, and cancellation races without
//! a network.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use gantry_core::error::GantryError;
use gantry_core::traits::PlatformAdapter;
use gantry_core::types::{
    ActorDetails, ActorSummary, DatasetPage, ItemQuery, Run, RunOptions, RunStatus,
};

/// How a scripted run behaves across successive `get_run` polls.
#[derive(Debug, Clone)]
pub struct RunScript {
    /// Polls before the run reports `terminal_status`. The starting
    /// `start_run` response does not count.
    pub polls_until_terminal: u32,
    pub terminal_status: RunStatus,
    pub dataset_id: Option<String>,
    pub status_message: Option<String>,
}

impl RunScript {
    pub fn instant_success(dataset_id: &str) -> Self {
        Self::success_after(1, dataset_id)
    }

    pub fn success_after(polls: u32, dataset_id: &str) -> Self {
        Self {
            polls_until_terminal: polls,
            terminal_status: RunStatus::Succeeded,
            dataset_id: Some(dataset_id.to_string()),
            status_message: None,
        }
    }

    pub fn failure(message: &str) -> Self {
        Self {
            polls_until_terminal: 1,
            terminal_status: RunStatus::Failed,
            dataset_id: None,
            status_message: Some(message.to_string()),
        }
    }

    pub fn timeout(message: &str) -> Self {
        Self {
            polls_until_terminal: 1,
            terminal_status: RunStatus::TimedOut,
            dataset_id: None,
            status_message: Some(message.to_string()),
        }
    }

    /// A run that never finishes on its own; only an abort ends it.
    pub fn never_finishes() -> Self {
        Self {
            polls_until_terminal: u32::MAX,
            terminal_status: RunStatus::Succeeded,
            dataset_id: None,
            status_message: None,
        }
    }
}

/// Record of one `start_run` call.
#[derive(Debug, Clone)]
pub struct StartedRun {
    pub run_id: String,
    pub actor_id: String,
    pub input: Value,
    pub options: RunOptions,
}

/// Record of one `abort_run` call.
#[derive(Debug, Clone)]
pub struct AbortCall {
    pub run_id: String,
    pub graceful: bool,
}

struct RunState {
    script: RunScript,
    actor_id: String,
    polls: u32,
    aborted: bool,
}

#[derive(Default)]
struct PlatformState {
    catalog: Vec<ActorSummary>,
    actors: HashMap<String, ActorDetails>,
    tool_servers: HashMap<String, String>,
    scripts: VecDeque<RunScript>,
    runs: HashMap<String, RunState>,
    datasets: HashMap<String, Vec<Value>>,
    started: Vec<StartedRun>,
    aborts: Vec<AbortCall>,
    details_calls: usize,
    probe_calls: usize,
    run_seq: usize,
}

/// In-memory platform with scripted runs and call recording.
#[derive(Default)]
pub struct MockPlatform {
    state: Mutex<PlatformState>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes an actor resolvable under both its id and its full name.
    /// Without a matching `add_tool_server`, the actor is a batch actor.
    pub async fn add_actor(&self, details: ActorDetails) {
        let mut state = self.state.lock().await;
        state.actors.insert(details.id.clone(), details.clone());
        state.actors.insert(details.name.clone(), details);
    }

    pub async fn set_catalog(&self, actors: Vec<ActorSummary>) {
        self.state.lock().await.catalog = actors;
    }

    pub async fn add_tool_server(&self, actor_id: &str, url: &str) {
        self.state
            .lock()
            .await
            .tool_servers
            .insert(actor_id.to_string(), url.to_string());
    }

    /// Queues the script the next `start_run` will follow. Runs started
    /// with an empty queue never finish on their own, which makes a
    /// missing script visible instead of silently succeeding.
    pub async fn queue_run(&self, script: RunScript) {
        self.state.lock().await.scripts.push_back(script);
    }

    pub async fn set_dataset(&self, dataset_id: &str, items: Vec<Value>) {
        self.state
            .lock()
            .await
            .datasets
            .insert(dataset_id.to_string(), items);
    }

    pub async fn started(&self) -> Vec<StartedRun> {
        self.state.lock().await.started.clone()
    }

    pub async fn aborts(&self) -> Vec<AbortCall> {
        self.state.lock().await.aborts.clone()
    }

    pub async fn details_calls(&self) -> usize {
        self.state.lock().await.details_calls
    }

    pub async fn probe_calls(&self) -> usize {
        self.state.lock().await.probe_calls
    }
}

fn not_found(what: &str) -> GantryError {
    GantryError::Platform {
        message: format!("platform API error (record-not-found): {what}"),
        status: Some(404),
        source: None,
    }
}

fn run_snapshot(run_id: &str, state: &RunState, status: RunStatus) -> Run {
    let terminal = status.is_terminal();
    Run {
        id: run_id.to_string(),
        actor_id: state.actor_id.clone(),
        status,
        status_message: if terminal {
            state.script.status_message.clone()
        } else {
            None
        },
        default_dataset_id: state.script.dataset_id.clone(),
        started_at: Some("2026-01-01T00:00:00Z".to_string()),
        finished_at: terminal.then(|| "2026-01-01T00:01:00Z".to_string()),
        duration_ms: terminal.then_some(60_000),
        cost_usd: terminal.then_some(0.05),
    }
}

#[async_trait]
impl PlatformAdapter for MockPlatform {
    async fn search_actors(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ActorSummary>, GantryError> {
        let state = self.state.lock().await;
        let needle = query.to_lowercase();
        Ok(state
            .catalog
            .iter()
            .filter(|actor| {
                actor.name.to_lowercase().contains(&needle)
                    || actor
                        .title
                        .as_deref()
                        .is_some_and(|t| t.to_lowercase().contains(&needle))
                    || actor
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            })
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn actor_details(&self, actor: &str) -> Result<ActorDetails, GantryError> {
        let mut state = self.state.lock().await;
        state.details_calls += 1;
        state
            .actors
            .get(actor)
            .cloned()
            .ok_or_else(|| not_found(&format!("actor {actor} was not found")))
    }

    async fn tool_server_url(&self, actor_id: &str) -> Result<Option<String>, GantryError> {
        let mut state = self.state.lock().await;
        state.probe_calls += 1;
        Ok(state.tool_servers.get(actor_id).cloned())
    }

    async fn start_run(
        &self,
        actor_id: &str,
        input: Value,
        options: RunOptions,
    ) -> Result<Run, GantryError> {
        let mut state = self.state.lock().await;
        let script = state
            .scripts
            .pop_front()
            .unwrap_or_else(RunScript::never_finishes);
        state.run_seq += 1;
        let run_id = format!("run-{}", state.run_seq);

        state.started.push(StartedRun {
            run_id: run_id.clone(),
            actor_id: actor_id.to_string(),
            input,
            options,
        });
        let run_state = RunState {
            script,
            actor_id: actor_id.to_string(),
            polls: 0,
            aborted: false,
        };
        let run = run_snapshot(&run_id, &run_state, RunStatus::Ready);
        state.runs.insert(run_id, run_state);
        Ok(run)
    }

    async fn get_run(&self, run_id: &str) -> Result<Run, GantryError> {
        let mut state = self.state.lock().await;
        let run_state = state
            .runs
            .get_mut(run_id)
            .ok_or_else(|| not_found(&format!("run {run_id} was not found")))?;
        run_state.polls += 1;

        let status = if run_state.aborted {
            RunStatus::Aborted
        } else if run_state.polls >= run_state.script.polls_until_terminal {
            run_state.script.terminal_status
        } else {
            RunStatus::Running
        };
        Ok(run_snapshot(run_id, run_state, status))
    }

    async fn abort_run(&self, run_id: &str, graceful: bool) -> Result<Run, GantryError> {
        let mut state = self.state.lock().await;
        state.aborts.push(AbortCall {
            run_id: run_id.to_string(),
            graceful,
        });
        let run_state = state
            .runs
            .get_mut(run_id)
            .ok_or_else(|| not_found(&format!("run {run_id} was not found")))?;
        run_state.aborted = true;
        Ok(run_snapshot(run_id, run_state, RunStatus::Aborted))
    }

    async fn dataset_items(
        &self,
        dataset_id: &str,
        query: ItemQuery,
    ) -> Result<DatasetPage, GantryError> {
        let state = self.state.lock().await;
        let items = state
            .datasets
            .get(dataset_id)
            .ok_or_else(|| not_found(&format!("dataset {dataset_id} was not found")))?;
        let page: Vec<Value> = items
            .iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();
        Ok(DatasetPage {
            items: page,
            total: items.len() as u64,
            offset: query.offset,
            limit: query.limit,
        })
    }
}

/// Minimal actor record for tests.
pub fn actor_details_fixture(id: &str, name: &str) -> ActorDetails {
    ActorDetails {
        id: id.to_string(),
        name: name.to_string(),
        title: Some("Test Actor".to_string()),
        description: Some("An actor for tests.".to_string()),
        readme: None,
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "url": { "type": "string" }
            }
        }),
        display_fields: vec!["title".to_string()],
        default_memory_mbytes: None,
        default_timeout_secs: None,
    }
}

pub fn actor_summary_fixture(id: &str, name: &str) -> ActorSummary {
    ActorSummary {
        id: id.to_string(),
        name: name.to_string(),
        title: Some("Test Actor".to_string()),
        description: Some("An actor for tests.".to_string()),
        pricing: None,
        total_runs: Some(42),
    }
}
