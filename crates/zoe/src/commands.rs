// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot inspection commands.

use zoe::AppContext;
use zoe_core::{InputSource, ZoeError};
use zoe_intent::UNKNOWN_INTENT;
use zoe_timer::format_duration;

/// `zoe modules`
pub async fn modules(ctx: AppContext) -> Result<(), ZoeError> {
    let listings = ctx.loader().list_modules()?;
    if listings.is_empty() {
        println!("No optional modules enabled.");
    }

    for module in &listings {
        let directory = module
            .directory
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "(not found)".to_string());
        println!("{}  {}", module.name, directory);
        if let Some(error) = &module.error {
            println!("  error:    {error}");
            continue;
        }
        println!("  intents:  {}", list_or_dash(&module.intents));
        println!("  handlers: {}", list_or_dash(&module.handlers));
    }

    ctx.shutdown().await
}

/// `zoe classify <text>`
pub async fn classify(ctx: AppContext, user_id: &str, text: &str) -> Result<(), ZoeError> {
    let outcome = ctx
        .pipeline()
        .await?
        .process(user_id, text, InputSource::Api)
        .await;

    println!(
        "intent:  {}",
        outcome.intent.as_deref().unwrap_or(UNKNOWN_INTENT)
    );
    println!("tier:    {}", outcome.tier);
    println!("success: {}", outcome.result.success);
    println!("latency: {:.2} ms", outcome.latency_ms);
    println!("reply:   {}", outcome.result.message);

    ctx.shutdown().await
}

/// `zoe timers <user>`
pub async fn timers(ctx: AppContext, user_id: &str) -> Result<(), ZoeError> {
    let active = ctx.timers().get_active_timers(user_id).await;
    if active.is_empty() {
        println!("No running timers for {user_id}.");
    }
    for entry in &active {
        println!(
            "{}  {:<16} {} left",
            entry.timer.id,
            entry.timer.label,
            format_duration(entry.remaining_seconds)
        );
    }

    ctx.shutdown().await
}

/// `zoe metrics [--hours N]`
pub async fn metrics(ctx: AppContext, hours: Option<u32>) -> Result<(), ZoeError> {
    let window = hours.unwrap_or(ctx.config().metrics.default_window_hours);
    let summary = ctx
        .metrics_collector()
        .await
        .get_performance_summary(window)
        .await;
    let json = serde_json::to_string_pretty(&summary)
        .map_err(|e| ZoeError::Internal(format!("failed to render metrics: {e}")))?;
    println!("{json}");

    ctx.shutdown().await
}

fn list_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}
