// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests through the composition root.
//!
//! Each test gets its own temp directory holding the database and the module
//! tree, so tests are independent and order-insensitive.

use std::time::Duration;

use zoe::AppContext;
use zoe_config::ZoeConfig;
use zoe_core::{InputSource, RequestOrigin};
use zoe_intent::UNKNOWN_INTENT;
use zoe_test_utils::ModuleFixture;

fn config_for(fixture: &ModuleFixture) -> ZoeConfig {
    let mut config = ZoeConfig::default();
    config.storage.database_path = fixture.root().join("zoe.db").display().to_string();
    config.timers.check_interval_ms = 20;
    config.modules.config_paths = vec![fixture.config_path().display().to_string()];
    config.modules.search_roots = vec![fixture.modules_root().display().to_string()];
    config
}

fn from_device(device_id: &str) -> RequestOrigin {
    RequestOrigin {
        device_id: Some(device_id.to_string()),
        ..RequestOrigin::default()
    }
}

// ---- Utterance to alert ----

#[tokio::test]
async fn spoken_timer_alerts_the_device_it_was_set_from() {
    let fixture = ModuleFixture::new(&[]);
    let ctx = AppContext::build(config_for(&fixture)).await.unwrap();
    let mut alerts = ctx.transport().connect("kitchen", "alice").await;

    let outcome = ctx
        .pipeline()
        .await
        .unwrap()
        .process_from(
            "alice",
            "set a tea timer for 1 second",
            InputSource::Voice,
            from_device("kitchen"),
        )
        .await;
    assert_eq!(outcome.intent.as_deref(), Some("StartTimer"));
    assert!(outcome.result.success, "{}", outcome.result.message);

    assert!(ctx.timers().start(ctx.config().timers.check_interval()));
    let alert = tokio::time::timeout(Duration::from_secs(5), alerts.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(alert.label, "tea");
    assert_eq!(alert.kind, "timer_complete");
    assert!(ctx.timers().get_active_timers("alice").await.is_empty());

    ctx.shutdown().await.unwrap();
}

#[tokio::test]
async fn alert_for_an_unreachable_device_waits_for_reconnect() {
    let fixture = ModuleFixture::new(&[]);
    let ctx = AppContext::build(config_for(&fixture)).await.unwrap();

    ctx.pipeline()
        .await
        .unwrap()
        .process_from(
            "alice",
            "start the timer for 1 second",
            InputSource::Touch,
            from_device("pad"),
        )
        .await;
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let summary = ctx.timers().tick().await;
    assert_eq!(summary.expired.len(), 1);
    assert!(!summary.reports[0].delivered());
    assert!(summary.reports[0].offline_queued);

    let mut alerts = ctx.transport().connect("pad", "alice").await;
    assert_eq!(ctx.timers().drain_offline("pad").await.unwrap(), 1);
    assert_eq!(alerts.recv().await.unwrap().label, "timer");
    assert_eq!(ctx.timers().drain_offline("pad").await.unwrap(), 0);

    ctx.shutdown().await.unwrap();
}

// ---- Modules ----

#[tokio::test]
async fn module_phrasing_drives_a_core_handler() {
    let fixture = ModuleFixture::new(&["kitchen"]);
    fixture.write_intents(
        "kitchen",
        "baking.toml",
        r#"
[intents.StartTimer]
data = [{ sentences = ["bake for {duration}"] }]
"#,
    );
    fixture.write_bindings(
        "kitchen",
        "[bindings]\ndescriptor = \"timers\"\nintents = [\"StartTimer\"]\n",
    );

    let ctx = AppContext::build(config_for(&fixture)).await.unwrap();
    let listings = ctx.loader().list_modules().unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].intents, vec!["StartTimer"]);
    assert_eq!(listings[0].handlers, vec!["StartTimer"]);

    let outcome = ctx
        .pipeline()
        .await
        .unwrap()
        .process("alice", "bake for 10 minutes", InputSource::Chat)
        .await;
    assert_eq!(outcome.intent.as_deref(), Some("StartTimer"));
    assert!(outcome.result.success);

    let active = ctx.timers().get_active_timers("alice").await;
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].timer.duration_seconds, 600);

    ctx.shutdown().await.unwrap();
}

#[tokio::test]
async fn enabled_but_missing_module_is_skipped() {
    let fixture = ModuleFixture::new(&["weather"]);
    let ctx = AppContext::build(config_for(&fixture)).await.unwrap();

    let pipeline = ctx.pipeline().await.unwrap();
    assert!(pipeline.classifier().intent_names().contains(&"StartTimer"));
    assert_eq!(pipeline.executor().len(), 3);

    ctx.shutdown().await.unwrap();
}

#[tokio::test]
async fn malformed_enablement_file_fails_pipeline_setup() {
    let fixture = ModuleFixture::new(&[]);
    std::fs::write(fixture.config_path(), "enabled_modules = \"music\"").unwrap();
    let ctx = AppContext::build(config_for(&fixture)).await.unwrap();

    assert!(ctx.pipeline().await.is_err());
    ctx.shutdown().await.unwrap();
}

// ---- Metrics ----

#[tokio::test]
async fn every_utterance_is_recorded() {
    let fixture = ModuleFixture::new(&[]);
    let ctx = AppContext::build(config_for(&fixture)).await.unwrap();
    let pipeline = ctx.pipeline().await.unwrap();

    pipeline
        .process("alice", "timer for 5 minutes", InputSource::Chat)
        .await;
    let miss = pipeline
        .process("alice", "what is the meaning of life", InputSource::Chat)
        .await;
    assert!(miss.intent.is_none());
    assert!(!miss.result.success);

    let metrics = ctx.metrics_collector().await;
    let events = metrics.get_executions(1).await;
    assert_eq!(events.len(), 2);
    assert!(events.iter().any(|e| e.intent_name == "StartTimer" && e.tier == 0 && e.success));
    assert!(events.iter().any(|e| e.intent_name == UNKNOWN_INTENT && e.tier == 3 && !e.success));

    let summary = metrics.get_performance_summary(1).await;
    assert_eq!(summary.total_events, 2);
    assert!((summary.success_rate - 50.0).abs() < 1e-9);

    ctx.shutdown().await.unwrap();
}

#[tokio::test]
async fn metrics_collector_is_created_once() {
    let fixture = ModuleFixture::new(&[]);
    let ctx = AppContext::build(config_for(&fixture)).await.unwrap();

    let first: *const _ = ctx.metrics_collector().await;
    let second: *const _ = ctx.metrics_collector().await;
    assert_eq!(first, second);

    ctx.shutdown().await.unwrap();
}
