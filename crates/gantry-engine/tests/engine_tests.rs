// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end engine tests against scripted platform and tool-server fakes.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use gantry_core::registry::PaymentMode;
use gantry_core::tool::{ToolCall, ToolKindTag};
use gantry_core::traits::{PlatformAdapter, ProgressSink, ToolServerAdapter};
use gantry_core::types::{ProgressUpdate, TaskRequest, ToolStatus};
use gantry_engine::{EngineOptions, ExecutionEngine, Services, builtin};
use gantry_test_utils::{
    MockPlatform, MockToolServers, RecordingProgress, RecordingTelemetry, RunScript,
    actor_details_fixture, actor_summary_fixture, remote_tool_fixture,
};

struct Harness {
    engine: ExecutionEngine,
    services: Arc<Services>,
    platform: Arc<MockPlatform>,
    servers: Arc<MockToolServers>,
    telemetry: Arc<RecordingTelemetry>,
}

fn fast_options() -> EngineOptions {
    EngineOptions {
        poll_interval: Duration::from_millis(5),
        max_sync_wait: Duration::from_millis(100),
        ..EngineOptions::default()
    }
}

async fn harness(options: EngineOptions) -> Harness {
    harness_with(
        Arc::new(MockPlatform::new()),
        Arc::new(MockToolServers::new()),
        options,
    )
    .await
}

async fn harness_with(
    platform: Arc<MockPlatform>,
    servers: Arc<MockToolServers>,
    options: EngineOptions,
) -> Harness {
    let services = Services::new(
        Arc::clone(&platform) as Arc<dyn PlatformAdapter>,
        Arc::clone(&servers) as Arc<dyn ToolServerAdapter>,
        options,
    );
    builtin::register_categories(&services, &["default".to_string()])
        .await
        .expect("builtin registration");

    let telemetry = Arc::new(RecordingTelemetry::new());
    let engine = ExecutionEngine::new(
        Arc::clone(&services),
        Arc::clone(&telemetry) as Arc<dyn gantry_core::traits::TelemetryAdapter>,
    );
    Harness {
        engine,
        services,
        platform,
        servers,
        telemetry,
    }
}

fn call(name: &str, arguments: Value) -> ToolCall {
    let Value::Object(map) = arguments else {
        panic!("arguments fixture must be an object");
    };
    ToolCall::new(name, map)
}

/// Registers a batch actor through add-actor and returns its tool name.
async fn register_batch_actor(harness: &Harness, id: &str, name: &str) -> String {
    harness
        .platform
        .add_actor(actor_details_fixture(id, name))
        .await;
    let result = harness
        .engine
        .execute(call("add-actor", json!({ "actor": name })))
        .await;
    assert_eq!(result.status, ToolStatus::Succeeded, "{result:?}");
    result.body.unwrap()["tool"].as_str().unwrap().to_string()
}

/// Polls get-task until the task reaches a terminal status.
async fn await_task(harness: &Harness, task_id: &str) -> Value {
    for _ in 0..500 {
        let result = harness
            .engine
            .execute(call("get-task", json!({ "task_id": task_id })))
            .await;
        assert_eq!(result.status, ToolStatus::Succeeded, "{result:?}");
        let body = result.body.unwrap();
        let status = body["status"].as_str().unwrap().to_string();
        if status != "created" && status != "working" {
            return body;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("task {task_id} never reached a terminal status");
}

#[tokio::test]
async fn unknown_tool_soft_fails_and_lists_available() {
    let harness = harness(fast_options()).await;
    let result = harness
        .engine
        .execute(call("frobnicate", json!({})))
        .await;

    assert_eq!(result.status, ToolStatus::SoftFail);
    let message = result.message.unwrap();
    assert!(message.contains("frobnicate"));
    assert!(message.contains("search-actors"));
}

#[tokio::test]
async fn client_namespaced_tool_names_resolve() {
    let harness = harness(fast_options()).await;
    harness
        .platform
        .set_catalog(vec![actor_summary_fixture("act-1", "acme/web-scraper")])
        .await;

    let result = harness
        .engine
        .execute(call("assistant__search-actors", json!({ "query": "scraper" })))
        .await;

    assert_eq!(result.status, ToolStatus::Succeeded, "{result:?}");
    let body = result.body.unwrap();
    assert_eq!(body["count"], json!(1));
    assert_eq!(body["actors"][0]["name"], json!("acme/web-scraper"));
}

#[tokio::test(start_paused = true)]
async fn registered_actor_runs_to_a_dataset_summary() {
    let harness = harness(fast_options()).await;
    let tool = register_batch_actor(&harness, "act-1", "acme/web-scraper").await;
    assert_eq!(tool, "acme--web-scraper");

    harness.platform.queue_run(RunScript::success_after(3, "ds-1")).await;
    harness
        .platform
        .set_dataset(
            "ds-1",
            vec![
                json!({ "title": "First", "url": "https://a" }),
                json!({ "title": "Second", "url": "https://b" }),
            ],
        )
        .await;

    let result = harness
        .engine
        .execute(call(&tool, json!({ "url": "https://example.com" })))
        .await;

    assert_eq!(result.status, ToolStatus::Succeeded, "{result:?}");
    let body = result.body.unwrap();
    assert_eq!(body["run_id"], json!("run-1"));
    assert_eq!(body["actor"], json!("acme/web-scraper"));
    assert_eq!(body["status"], json!("SUCCEEDED"));
    assert_eq!(body["item_count"], json!(2));
    assert_eq!(body["preview"].as_array().unwrap().len(), 2);
    assert_eq!(
        body["schema"]["properties"]["title"],
        json!({ "type": "string" })
    );

    let started = harness.platform.started().await;
    assert_eq!(started.len(), 1);
    assert_eq!(started[0].input, json!({ "url": "https://example.com" }));
    assert_eq!(started[0].options.memory_mbytes, Some(1024));

    let events = harness.telemetry.events();
    let last = events.last().unwrap();
    assert_eq!(last.tool_name, tool);
    assert_eq!(last.status, ToolStatus::Succeeded);
}

#[tokio::test]
async fn add_actor_is_idempotent_and_memoizes_discovery() {
    let harness = harness(fast_options()).await;
    let tool = register_batch_actor(&harness, "act-1", "acme/web-scraper").await;

    let again = harness
        .engine
        .execute(call("add-actor", json!({ "actor": "acme/web-scraper" })))
        .await;
    assert_eq!(again.status, ToolStatus::Succeeded);
    let body = again.body.unwrap();
    assert_eq!(body["added"], json!(false));
    assert_eq!(body["tool"], json!(tool));

    // Details and the tool-server probe each hit the platform once.
    assert_eq!(harness.platform.details_calls().await, 1);
    assert_eq!(harness.platform.probe_calls().await, 1);
}

#[tokio::test]
async fn add_actor_registers_every_tool_of_a_tool_server() {
    let servers = Arc::new(MockToolServers::with_tools(vec![
        remote_tool_fixture("summarize"),
        remote_tool_fixture("translate"),
    ]));
    let harness = harness_with(Arc::new(MockPlatform::new()), servers, fast_options()).await;
    harness
        .platform
        .add_actor(actor_details_fixture("act-9", "acme/toolkit"))
        .await;
    harness
        .platform
        .add_tool_server("act-9", "https://act-9.runs.gantry.dev/mcp")
        .await;

    let result = harness
        .engine
        .execute(call("add-actor", json!({ "actor": "acme/toolkit" })))
        .await;

    assert_eq!(result.status, ToolStatus::Succeeded, "{result:?}");
    let body = result.body.unwrap();
    assert_eq!(body["kind"], json!("tool-server"));
    assert_eq!(
        body["tools"],
        json!(["acme--toolkit--summarize", "acme--toolkit--translate"])
    );

    let registry = harness.services.registry.read().await;
    assert_eq!(
        registry.names_by_kind(ToolKindTag::Proxied),
        vec!["acme--toolkit--summarize", "acme--toolkit--translate"]
    );
    drop(registry);

    // The listing connection was closed.
    assert_eq!(harness.servers.close_count(), 1);
}

#[tokio::test]
async fn proxied_calls_relay_and_always_close() {
    let servers = Arc::new(MockToolServers::with_tools(vec![remote_tool_fixture(
        "summarize",
    )]));
    let harness = harness_with(Arc::new(MockPlatform::new()), servers, fast_options()).await;
    harness
        .platform
        .add_actor(actor_details_fixture("act-9", "acme/toolkit"))
        .await;
    harness
        .platform
        .add_tool_server("act-9", "https://act-9.runs.gantry.dev/mcp")
        .await;
    harness
        .engine
        .execute(call("add-actor", json!({ "actor": "acme/toolkit" })))
        .await;

    harness
        .servers
        .push_call_result(json!({ "summary": "short" }))
        .await;
    let result = harness
        .engine
        .execute(call("acme--toolkit--summarize", json!({ "text": "long text" })))
        .await;

    assert_eq!(result.status, ToolStatus::Succeeded, "{result:?}");
    assert_eq!(result.body.unwrap(), json!({ "summary": "short" }));

    let calls = harness.servers.calls().await;
    assert_eq!(calls.len(), 1);
    // Relayed under the origin name, not the prefixed one.
    assert_eq!(calls[0].name, "summarize");

    let connects = harness.servers.connects().await;
    assert_eq!(connects.len(), 2, "one listing connect, one call connect");
    assert_eq!(harness.servers.close_count(), 2);
}

#[tokio::test]
async fn failed_proxied_calls_name_the_origin_and_still_close() {
    let servers = Arc::new(MockToolServers::with_tools(vec![remote_tool_fixture(
        "summarize",
    )]));
    let harness = harness_with(Arc::new(MockPlatform::new()), servers, fast_options()).await;
    harness
        .platform
        .add_actor(actor_details_fixture("act-9", "acme/toolkit"))
        .await;
    harness
        .platform
        .add_tool_server("act-9", "https://act-9.runs.gantry.dev/mcp")
        .await;
    harness
        .engine
        .execute(call("add-actor", json!({ "actor": "acme/toolkit" })))
        .await;

    harness.servers.push_call_error("tool exploded").await;
    let result = harness
        .engine
        .execute(call("acme--toolkit--summarize", json!({})))
        .await;

    assert_eq!(result.status, ToolStatus::Failed);
    let message = result.message.unwrap();
    assert!(message.contains("summarize"), "got: {message}");
    assert!(message.contains("act-9"), "got: {message}");
    assert!(message.contains("tool exploded"), "got: {message}");

    assert_eq!(harness.servers.close_count(), 2);
}

#[tokio::test]
async fn proxied_calls_pass_upstream_progress_through_unchanged() {
    let servers = Arc::new(MockToolServers::with_tools(vec![remote_tool_fixture(
        "summarize",
    )]));
    let harness = harness_with(
        Arc::new(MockPlatform::new()),
        Arc::clone(&servers),
        fast_options(),
    )
    .await;
    harness
        .platform
        .add_actor(actor_details_fixture("act-9", "acme/toolkit"))
        .await;
    harness
        .platform
        .add_tool_server("act-9", "https://act-9.runs.gantry.dev/mcp")
        .await;
    harness
        .engine
        .execute(call("add-actor", json!({ "actor": "acme/toolkit" })))
        .await;

    servers
        .push_progress_update(ProgressUpdate {
            progress: 2.0,
            total: Some(5.0),
            message: Some("page 2 of 5".to_string()),
        })
        .await;

    let progress = Arc::new(RecordingProgress::new());
    let mut watched_call = call("acme--toolkit--summarize", json!({}));
    watched_call.progress = Some(Arc::clone(&progress) as Arc<dyn ProgressSink>);
    let result = harness.engine.execute(watched_call).await;
    assert_eq!(result.status, ToolStatus::Succeeded, "{result:?}");

    let updates = progress.updates();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].progress, 2.0);
    assert_eq!(updates[0].total, Some(5.0));
    assert_eq!(updates[0].message.as_deref(), Some("page 2 of 5"));
}

#[tokio::test(start_paused = true)]
async fn cancelled_remote_job_aborts_exactly_once() {
    let harness = harness(fast_options()).await;
    let tool = register_batch_actor(&harness, "act-1", "acme/web-scraper").await;
    harness.platform.queue_run(RunScript::never_finishes()).await;

    let mut cancelled_call = call(&tool, json!({}));
    let token = cancelled_call.cancel.clone();
    let engine = harness.engine.clone();
    let running = tokio::spawn(async move { engine.execute(cancelled_call).await });

    // Let a few polls happen, then cancel.
    tokio::time::sleep(Duration::from_millis(20)).await;
    token.cancel();
    let result = running.await.unwrap();

    assert_eq!(result.status, ToolStatus::Aborted);
    assert!(result.body.is_none());
    assert!(result.message.is_none());

    let aborts = harness.platform.aborts().await;
    assert_eq!(aborts.len(), 1, "abort must fire exactly once");
    assert_eq!(aborts[0].run_id, "run-1");
    assert!(!aborts[0].graceful);
}

#[tokio::test(start_paused = true)]
async fn slow_runs_hand_back_a_pointer_at_the_sync_wait_cap() {
    let harness = harness(fast_options()).await;
    let tool = register_batch_actor(&harness, "act-1", "acme/web-scraper").await;
    harness
        .platform
        .queue_run(RunScript::success_after(10_000, "ds-1"))
        .await;

    let result = harness.engine.execute(call(&tool, json!({}))).await;

    assert_eq!(result.status, ToolStatus::Succeeded, "{result:?}");
    let body = result.body.unwrap();
    assert_eq!(body["run_id"], json!("run-1"));
    assert_eq!(body["status"], json!("RUNNING"));
    assert!(result.message.unwrap().contains("still"));

    // The run keeps going; nothing aborted it.
    assert!(harness.platform.aborts().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_runs_report_failed_with_the_platform_message() {
    let harness = harness(fast_options()).await;
    let tool = register_batch_actor(&harness, "act-1", "acme/web-scraper").await;
    harness
        .platform
        .queue_run(RunScript::failure("out of memory"))
        .await;

    let result = harness.engine.execute(call(&tool, json!({}))).await;

    assert_eq!(result.status, ToolStatus::Failed);
    let message = result.message.unwrap();
    assert!(message.contains("acme/web-scraper"), "got: {message}");
    assert!(message.contains("out of memory"), "got: {message}");
}

#[tokio::test(start_paused = true)]
async fn timed_out_runs_soft_fail_with_a_timeout_hint() {
    let harness = harness(fast_options()).await;
    let tool = register_batch_actor(&harness, "act-1", "acme/web-scraper").await;
    harness
        .platform
        .queue_run(RunScript::timeout("hit the 60s limit"))
        .await;

    let result = harness.engine.execute(call(&tool, json!({}))).await;

    assert_eq!(result.status, ToolStatus::SoftFail);
    assert!(result.message.unwrap().contains("timeout_secs"));
}

#[tokio::test(start_paused = true)]
async fn payment_mode_gates_registered_actors() {
    let options = EngineOptions {
        payment: PaymentMode::Required,
        ..fast_options()
    };
    let harness = harness(options).await;
    let tool = register_batch_actor(&harness, "act-1", "acme/web-scraper").await;

    let refused = harness.engine.execute(call(&tool, json!({}))).await;
    assert_eq!(refused.status, ToolStatus::SoftFail);
    assert!(refused.message.unwrap().contains("payment_token"));
    assert!(harness.platform.started().await.is_empty());

    harness.platform.queue_run(RunScript::success_after(1, "ds-1")).await;
    harness.platform.set_dataset("ds-1", vec![]).await;
    let accepted = harness
        .engine
        .execute(call(&tool, json!({ "payment_token": "tok_1" })))
        .await;
    assert_eq!(accepted.status, ToolStatus::Succeeded, "{accepted:?}");

    let started = harness.platform.started().await;
    assert_eq!(started[0].input["payment_token"], json!("tok_1"));
}

#[tokio::test(start_paused = true)]
async fn rented_actors_skip_the_payment_gate() {
    let options = EngineOptions {
        payment: PaymentMode::Required,
        ..fast_options()
    };
    let harness = harness(options).await;
    let tool = register_batch_actor(&harness, "act-1", "acme/web-scraper").await;
    harness.platform.queue_run(RunScript::success_after(1, "ds-1")).await;
    harness.platform.set_dataset("ds-1", vec![]).await;

    let mut rented_call = call(&tool, json!({}));
    rented_call.meta.rented_actor_ids = vec!["act-1".to_string()];
    let result = harness.engine.execute(rented_call).await;

    assert_eq!(result.status, ToolStatus::Succeeded, "{result:?}");
}

#[tokio::test(start_paused = true)]
async fn task_mode_runs_in_the_background_to_completion() {
    let harness = harness(fast_options()).await;
    let tool = register_batch_actor(&harness, "act-1", "acme/web-scraper").await;
    harness.platform.queue_run(RunScript::success_after(3, "ds-1")).await;
    harness
        .platform
        .set_dataset("ds-1", vec![json!({ "title": "only item" })])
        .await;

    let mut task_call = call(&tool, json!({}));
    task_call.meta.task = Some(TaskRequest { ttl_secs: None });
    let accepted = harness.engine.execute(task_call).await;

    assert_eq!(accepted.status, ToolStatus::Succeeded, "{accepted:?}");
    let body = accepted.body.unwrap();
    assert_eq!(body["status"], json!("created"));
    let task_id = body["task_id"].as_str().unwrap().to_string();

    let finished = await_task(&harness, &task_id).await;
    assert_eq!(finished["status"], json!("completed"));
    assert_eq!(finished["result"]["status"], json!("SUCCEEDED"));
    assert_eq!(finished["result"]["body"]["item_count"], json!(1));
}

#[tokio::test(start_paused = true)]
async fn cancelling_a_task_aborts_its_run_and_drops_the_result() {
    let harness = harness(fast_options()).await;
    let tool = register_batch_actor(&harness, "act-1", "acme/web-scraper").await;
    harness.platform.queue_run(RunScript::never_finishes()).await;

    let mut task_call = call(&tool, json!({}));
    task_call.meta.task = Some(TaskRequest { ttl_secs: None });
    let accepted = harness.engine.execute(task_call).await;
    let task_id = accepted.body.unwrap()["task_id"]
        .as_str()
        .unwrap()
        .to_string();

    // Let the worker start its run before cancelling.
    tokio::time::sleep(Duration::from_millis(20)).await;
    let cancelled = harness
        .engine
        .execute(call("cancel-task", json!({ "task_id": task_id })))
        .await;
    assert_eq!(cancelled.status, ToolStatus::Succeeded);
    assert_eq!(cancelled.body.unwrap()["status"], json!("cancelled"));

    let finished = await_task(&harness, &task_id).await;
    assert_eq!(finished["status"], json!("cancelled"));
    assert!(finished.get("result").is_none(), "{finished:?}");

    // The worker saw the cancellation and aborted the platform run.
    for _ in 0..500 {
        if !harness.platform.aborts().await.is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let aborts = harness.platform.aborts().await;
    assert_eq!(aborts.len(), 1);
    assert!(!aborts[0].graceful);
}

#[tokio::test]
async fn get_dataset_items_projects_onto_requested_fields() {
    let options = EngineOptions {
        preview_char_limit: 120,
        ..fast_options()
    };
    let harness = harness(options).await;
    harness
        .platform
        .set_dataset(
            "ds-1",
            vec![
                json!({ "title": "First", "noise": "x".repeat(200) }),
                json!({ "title": "Second", "noise": "y".repeat(200) }),
            ],
        )
        .await;

    let result = harness
        .engine
        .execute(call(
            "get-dataset-items",
            json!({ "dataset_id": "ds-1", "fields": ["title"] }),
        ))
        .await;

    assert_eq!(result.status, ToolStatus::Succeeded, "{result:?}");
    let body = result.body.unwrap();
    assert_eq!(body["total"], json!(2));
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0], json!({ "title": "First" }));
    assert!(items[0].get("noise").is_none());
}

#[tokio::test]
async fn call_actor_validates_input_against_the_actor_schema() {
    let harness = harness(fast_options()).await;
    harness
        .platform
        .add_actor(actor_details_fixture("act-1", "acme/web-scraper"))
        .await;

    let result = harness
        .engine
        .execute(call(
            "call-actor",
            json!({ "actor": "acme/web-scraper", "input": { "url": 7 } }),
        ))
        .await;

    assert_eq!(result.status, ToolStatus::SoftFail);
    let message = result.message.unwrap();
    assert!(message.contains("failed validation"), "got: {message}");
    assert!(harness.platform.started().await.is_empty());
}

#[tokio::test]
async fn removing_one_server_tool_removes_its_siblings() {
    let servers = Arc::new(MockToolServers::with_tools(vec![
        remote_tool_fixture("summarize"),
        remote_tool_fixture("translate"),
    ]));
    let harness = harness_with(Arc::new(MockPlatform::new()), servers, fast_options()).await;
    harness
        .platform
        .add_actor(actor_details_fixture("act-9", "acme/toolkit"))
        .await;
    harness
        .platform
        .add_tool_server("act-9", "https://act-9.runs.gantry.dev/mcp")
        .await;
    harness
        .engine
        .execute(call("add-actor", json!({ "actor": "acme/toolkit" })))
        .await;

    let result = harness
        .engine
        .execute(call("remove-actor", json!({ "tool": "acme--toolkit--summarize" })))
        .await;

    assert_eq!(result.status, ToolStatus::Succeeded, "{result:?}");
    let removed = result.body.unwrap()["removed"].clone();
    assert_eq!(
        removed,
        json!(["acme--toolkit--summarize", "acme--toolkit--translate"])
    );

    let registry = harness.services.registry.read().await;
    assert!(registry.names_by_kind(ToolKindTag::Proxied).is_empty());
}

#[tokio::test]
async fn builtin_tools_cannot_be_removed() {
    let harness = harness(fast_options()).await;
    let result = harness
        .engine
        .execute(call("remove-actor", json!({ "tool": "search-actors" })))
        .await;

    assert_eq!(result.status, ToolStatus::SoftFail);
    assert!(result.message.unwrap().contains("built-in"));
}

#[tokio::test(start_paused = true)]
async fn forced_async_detaches_and_the_run_stays_pollable() {
    let options = EngineOptions {
        force_async: true,
        ..fast_options()
    };
    let harness = harness(options).await;
    let tool = register_batch_actor(&harness, "act-1", "acme/web-scraper").await;
    harness.platform.queue_run(RunScript::success_after(1, "ds-1")).await;

    let result = harness.engine.execute(call(&tool, json!({}))).await;
    assert_eq!(result.status, ToolStatus::Succeeded, "{result:?}");
    let body = result.body.unwrap();
    assert_eq!(body["run_id"], json!("run-1"));

    let polled = harness
        .engine
        .execute(call("get-run", json!({ "run_id": "run-1" })))
        .await;
    assert_eq!(polled.status, ToolStatus::Succeeded);
    assert_eq!(polled.body.unwrap()["status"], json!("SUCCEEDED"));
}

#[tokio::test(start_paused = true)]
async fn progress_updates_flow_while_a_run_is_polled() {
    let harness = harness(fast_options()).await;
    let tool = register_batch_actor(&harness, "act-1", "acme/web-scraper").await;
    harness.platform.queue_run(RunScript::success_after(4, "ds-1")).await;
    harness.platform.set_dataset("ds-1", vec![]).await;

    let progress = Arc::new(RecordingProgress::new());
    let mut watched_call = call(&tool, json!({}));
    watched_call.progress = Some(Arc::clone(&progress) as Arc<dyn ProgressSink>);

    let result = harness.engine.execute(watched_call).await;
    assert_eq!(result.status, ToolStatus::Succeeded, "{result:?}");

    let updates = progress.updates();
    assert!(updates.len() >= 4, "got {} updates", updates.len());
    assert!(updates[0].message.as_deref().unwrap().contains("run-1"));
    // Progress counts up monotonically.
    assert!(updates.windows(2).all(|w| w[0].progress < w[1].progress));
}

fn bare_services(options: EngineOptions) -> Arc<Services> {
    Services::new(
        Arc::new(MockPlatform::new()) as Arc<dyn PlatformAdapter>,
        Arc::new(MockToolServers::new()) as Arc<dyn ToolServerAdapter>,
        options,
    )
}

#[tokio::test]
async fn categories_register_their_documented_tools() {
    let services = bare_services(EngineOptions::default());
    builtin::register_categories(&services, &["discovery".to_string(), "tasks".to_string()])
        .await
        .unwrap();

    let names = services.registry.read().await.names();
    assert_eq!(
        names,
        vec!["cancel-task", "fetch-actor-details", "get-task", "search-actors"]
    );
}

#[tokio::test]
async fn disabling_mutation_drops_the_mutating_pair() {
    let options = EngineOptions {
        enable_mutation: false,
        ..EngineOptions::default()
    };
    let services = bare_services(options);
    builtin::register_categories(&services, &["runtime".to_string()])
        .await
        .unwrap();

    let names = services.registry.read().await.names();
    assert_eq!(names, vec!["call-actor", "get-run"]);
}

#[tokio::test]
async fn overlapping_categories_register_each_tool_once() {
    let services = bare_services(EngineOptions::default());
    let count =
        builtin::register_categories(&services, &["default".to_string(), "discovery".to_string()])
            .await
            .unwrap();

    assert_eq!(count, 9);
    assert_eq!(services.registry.read().await.len(), 9);
}

#[tokio::test]
async fn an_unknown_category_names_the_known_ones() {
    let services = bare_services(EngineOptions::default());
    let err = builtin::register_categories(&services, &["storge".to_string()])
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("storge"), "got: {message}");
    assert!(message.contains("discovery"), "got: {message}");
}
