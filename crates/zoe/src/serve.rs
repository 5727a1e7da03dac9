// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `zoe serve`: run the timer loop until a shutdown signal arrives.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use zoe::{AppContext, CONSOLE_DEVICE, install_signal_handler};
use zoe_core::{InputSource, RequestOrigin, ZoeError};

/// Initialise the tracing subscriber.
///
/// `RUST_LOG` wins over the configured level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("zoe={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

pub async fn run_serve(ctx: AppContext, console_user: Option<String>) -> Result<(), ZoeError> {
    zoe_metrics::recording::register_metrics();
    info!(name = %ctx.config().agent.name, "starting zoe");

    // Fail before starting the loop if modules are misconfigured.
    ctx.pipeline().await?;

    let interval = ctx.config().timers.check_interval();
    ctx.timers().start(interval);
    info!(
        interval_ms = interval.as_millis() as u64,
        callbacks = ?ctx.timers().callback_ids(),
        "timer service running"
    );

    let cancel = install_signal_handler();
    match console_user {
        Some(user) => run_console(&ctx, &user, &cancel).await?,
        None => cancel.cancelled().await,
    }

    info!("shutting down");
    ctx.shutdown().await
}

/// Read utterances from stdin and print replies and timer alerts.
///
/// End of input shuts the process down like a signal would.
async fn run_console(
    ctx: &AppContext,
    user_id: &str,
    cancel: &CancellationToken,
) -> Result<(), ZoeError> {
    let pipeline = ctx.pipeline().await?;
    let mut alerts = ctx.transport().connect(CONSOLE_DEVICE, user_id).await;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let origin = RequestOrigin {
        device_id: Some(CONSOLE_DEVICE.to_string()),
        ..RequestOrigin::default()
    };

    let pending = ctx.timers().drain_offline(CONSOLE_DEVICE).await?;
    if pending > 0 {
        info!(pending, "delivered queued console notifications");
    }

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            Some(alert) = alerts.recv() => {
                println!("[{}] {}", alert.priority, alert.message);
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let text = line.trim();
                    if text.is_empty() {
                        continue;
                    }
                    let outcome = pipeline
                        .process_from(user_id, text, InputSource::Chat, origin.clone())
                        .await;
                    println!("{}", outcome.result.message);
                }
                Ok(None) => {
                    info!("console input closed");
                    cancel.cancel();
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "console read failed");
                    cancel.cancel();
                    break;
                }
            }
        }
    }

    ctx.transport().disconnect(CONSOLE_DEVICE).await;
    Ok(())
}
