// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The timer background service.
//!
//! One spawned task alternates between a tick (scan, callbacks, routing) and
//! a fixed sleep. Stopping cancels the task at its next await point, which
//! can leave at most one tick's timers completed but not yet announced.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use zoe_config::TimerConfig;
use zoe_core::{ActiveTimer, MAX_TIMER_SECONDS, NewTimer, Timer, ZoeError};
use zoe_storage::Database;
use zoe_storage::queries::{offline, timers};

use crate::callbacks::{CallbackRegistry, LOG_CALLBACK_ID, LogCallback, TimerCallback};
use crate::router::{NotificationRouter, RoutingReport};
use crate::scanner::ExpiryScanner;

/// Default pause between ticks.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(1);

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Timers that expired in this tick.
    pub expired: Vec<String>,
    pub callback_failures: usize,
    pub reports: Vec<RoutingReport>,
}

/// The parts a tick needs, cloned into the background task.
#[derive(Clone)]
struct Ticker {
    scanner: ExpiryScanner,
    router: NotificationRouter,
    callbacks: Arc<CallbackRegistry>,
}

impl Ticker {
    async fn tick(&self) -> TickSummary {
        let batch = self.scanner.scan().await;
        let mut summary = TickSummary::default();
        for timer in batch {
            summary.callback_failures += self.callbacks.dispatch(&timer).await;
            summary.reports.push(self.router.route_timer(&timer).await);
            summary.expired.push(timer.id);
        }
        summary
    }

    async fn run(self, interval: Duration, cancel: CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                summary = self.tick() => {
                    if !summary.expired.is_empty() {
                        debug!(
                            expired = summary.expired.len(),
                            callback_failures = summary.callback_failures,
                            "timer tick processed"
                        );
                    }
                }
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }
        info!("timer loop stopped");
    }
}

struct RunningLoop {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the timer loop, its callbacks and the timer store access the timer
/// intents need.
pub struct TimerService {
    db: Database,
    ticker: Ticker,
    task: Mutex<Option<RunningLoop>>,
}

impl TimerService {
    /// Build a stopped service with the `log` callback registered.
    pub fn new(db: Database, router: NotificationRouter) -> Self {
        let callbacks = Arc::new(CallbackRegistry::new());
        callbacks.register(LOG_CALLBACK_ID, Arc::new(LogCallback));
        Self {
            ticker: Ticker {
                scanner: ExpiryScanner::new(db.clone()),
                router,
                callbacks,
            },
            db,
            task: Mutex::new(None),
        }
    }

    /// Build a service with the router's offline TTL and the `log` callback
    /// taken from `config`.
    pub fn from_config(config: &TimerConfig, db: Database, router: NotificationRouter) -> Self {
        let router = router.with_offline_ttl(Duration::from_secs(config.offline_ttl_secs));
        let service = Self::new(db, router);
        if !config.log_callback {
            service.unregister_callback(LOG_CALLBACK_ID);
        }
        service
    }

    pub fn router(&self) -> &NotificationRouter {
        &self.ticker.router
    }

    /// Launch the background loop.
    ///
    /// Returns `false`, and changes nothing, if the loop is already running.
    pub fn start(&self, interval: Duration) -> bool {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.as_ref().is_some_and(|running| !running.handle.is_finished()) {
            warn!("timer service already running");
            return false;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(self.ticker.clone().run(interval, cancel.clone()));
        *task = Some(RunningLoop { cancel, handle });
        info!(interval_ms = interval.as_millis() as u64, "timer service started");
        true
    }

    /// Stop the loop and wait for it to exit. A no-op when stopped.
    pub async fn stop(&self) {
        let running = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(running) = running else {
            debug!("timer service already stopped");
            return;
        };

        running.cancel.cancel();
        if let Err(e) = running.handle.await {
            warn!(error = %e, "timer loop ended abnormally");
        }
        info!("timer service stopped");
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }

    /// Run one scan-notify cycle in the caller's task.
    pub async fn tick(&self) -> TickSummary {
        self.ticker.tick().await
    }

    /// Add a callback, or replace the one registered under `id`.
    pub fn register_callback(&self, id: &str, callback: Arc<dyn TimerCallback>) {
        self.ticker.callbacks.register(id, callback);
        debug!(callback = id, "timer callback registered");
    }

    /// Remove a callback. Unknown ids are ignored.
    pub fn unregister_callback(&self, id: &str) {
        if self.ticker.callbacks.unregister(id) {
            debug!(callback = id, "timer callback unregistered");
        }
    }

    pub fn callback_ids(&self) -> Vec<String> {
        self.ticker.callbacks.ids()
    }

    /// Pending timers of `user_id` with their remaining time as of now.
    ///
    /// A store failure is logged and reported as no timers.
    pub async fn get_active_timers(&self, user_id: &str) -> Vec<ActiveTimer> {
        self.active_timers_at(user_id, Utc::now()).await
    }

    /// Same as [`get_active_timers`](Self::get_active_timers) at a fixed time.
    pub async fn active_timers_at(&self, user_id: &str, now: DateTime<Utc>) -> Vec<ActiveTimer> {
        match timers::active_timers(&self.db, user_id, now).await {
            Ok(pending) => pending
                .into_iter()
                .map(|timer| ActiveTimer {
                    remaining_seconds: timer.remaining_seconds(now),
                    timer,
                })
                .collect(),
            Err(e) => {
                warn!(user_id, error = %e, "active timer lookup failed");
                Vec::new()
            }
        }
    }

    pub async fn create_timer(&self, new: NewTimer) -> Result<Timer, ZoeError> {
        if new.duration_seconds <= 0 {
            return Err(ZoeError::Internal(format!(
                "timer duration must be positive, got {}",
                new.duration_seconds
            )));
        }
        if new.duration_seconds > MAX_TIMER_SECONDS {
            return Err(ZoeError::Internal(format!(
                "timer duration {}s exceeds the {MAX_TIMER_SECONDS}s limit",
                new.duration_seconds
            )));
        }
        let timer = timers::create_timer(&self.db, new, Utc::now()).await?;
        info!(
            user_id = %timer.user_id,
            timer_id = %timer.id,
            label = %timer.label,
            duration_seconds = timer.duration_seconds,
            "timer created"
        );
        Ok(timer)
    }

    /// Cancel one of the user's pending timers.
    pub async fn cancel_timer(&self, user_id: &str, timer_id: &str) -> Result<bool, ZoeError> {
        let cancelled = timers::cancel_timer(&self.db, user_id, timer_id).await?;
        if cancelled {
            info!(user_id, timer_id, "timer cancelled");
        }
        Ok(cancelled)
    }

    /// Push queued offline notifications to a device that just reconnected.
    ///
    /// Stops at the first failed send so the remaining entries stay queued.
    /// Returns how many were delivered.
    pub async fn drain_offline(&self, device_id: &str) -> Result<usize, ZoeError> {
        let transport = self.ticker.router.transport();
        if !transport.is_connected(device_id).await {
            return Ok(0);
        }

        let pending = offline::pending_for_device(&self.db, device_id, Utc::now()).await?;
        let mut delivered = 0;
        for entry in pending {
            if let Err(e) = transport.send_to_device(device_id, &entry.notification).await {
                warn!(device_id, error = %e, "offline drain interrupted");
                break;
            }
            offline::mark_delivered(&self.db, entry.id).await?;
            delivered += 1;
        }
        if delivered > 0 {
            info!(device_id, delivered, "offline notifications drained");
        }
        Ok(delivered)
    }
}

impl Drop for TimerService {
    fn drop(&mut self) {
        let task = self.task.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(running) = task.take() {
            running.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    use chrono::Duration as ChronoDuration;
    use tracing_test::traced_test;
    use zoe_test_utils::{
        MockDeviceRegistry, MockOfflineSink, MockTransport, SentNotification, test_database,
    };

    use crate::callbacks::callback_fn;

    async fn service() -> (TimerService, Database, MockTransport) {
        let db = test_database().await;
        let transport = MockTransport::new();
        let router = NotificationRouter::new(
            Arc::new(transport.clone()),
            Arc::new(MockDeviceRegistry::new()),
            Arc::new(MockOfflineSink::new()),
        );
        (TimerService::new(db.clone(), router), db, transport)
    }

    async fn expired_timer(db: &Database, label: &str) -> Timer {
        timers::create_timer(
            db,
            NewTimer::new("alice", label, 5),
            Utc::now() - ChronoDuration::seconds(10),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn log_callback_is_preregistered() {
        let (service, _, _) = service().await;
        assert_eq!(service.callback_ids(), vec![LOG_CALLBACK_ID]);
    }

    #[tokio::test]
    async fn tick_runs_callbacks_then_routes() {
        let (service, db, transport) = service().await;
        transport.set_sessions("alice", 1).await;
        let timer = expired_timer(&db, "tea").await;

        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        service.register_callback(
            "collect",
            callback_fn(move |user, timer| {
                let sink = Arc::clone(&sink);
                async move {
                    sink.lock().unwrap().push((user, timer.id));
                    Ok(())
                }
            }),
        );

        let summary = service.tick().await;
        assert_eq!(summary.expired, vec![timer.id.clone()]);
        assert_eq!(*seen.lock().unwrap(), vec![("alice".to_string(), timer.id)]);
        assert_eq!(transport.broadcasts().await, vec!["alice"]);
        assert!(service.tick().await.expired.is_empty());
    }

    #[tokio::test]
    #[traced_test]
    async fn second_start_warns_and_keeps_the_running_loop() {
        let (service, _, _) = service().await;
        assert!(service.start(std::time::Duration::from_millis(10)));
        assert!(!service.start(std::time::Duration::from_millis(10)));
        assert!(logs_contain("timer service already running"));

        service.stop().await;
        assert!(logs_contain("timer service stopped"));
    }

    #[tokio::test]
    async fn start_and_stop_are_idempotent() {
        let (service, _, _) = service().await;
        assert!(!service.is_running());

        assert!(service.start(std::time::Duration::from_millis(10)));
        assert!(service.is_running());
        assert!(!service.start(std::time::Duration::from_millis(10)));

        service.stop().await;
        assert!(!service.is_running());
        service.stop().await;

        assert!(service.start(std::time::Duration::from_millis(10)));
        service.stop().await;
    }

    #[tokio::test]
    async fn active_timers_report_remaining_time() {
        let (service, db, _) = service().await;
        let now = Utc::now();
        timers::create_timer(&db, NewTimer::new("alice", "pasta", 30), now)
            .await
            .unwrap();
        timers::create_timer(&db, NewTimer::new("bob", "eggs", 30), now)
            .await
            .unwrap();

        let active = service.active_timers_at("alice", now + ChronoDuration::seconds(12)).await;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].timer.label, "pasta");
        assert_eq!(active[0].remaining_seconds, 18);
    }

    #[tokio::test]
    async fn create_rejects_out_of_range_durations() {
        let (service, _, _) = service().await;
        assert!(service.create_timer(NewTimer::new("alice", "x", 0)).await.is_err());
        assert!(
            service
                .create_timer(NewTimer::new("alice", "x", MAX_TIMER_SECONDS + 1))
                .await
                .is_err()
        );
        assert!(
            service
                .create_timer(NewTimer::new("alice", "x", MAX_TIMER_SECONDS))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn cancel_only_affects_own_pending_timers() {
        let (service, _, _) = service().await;
        let timer = service
            .create_timer(NewTimer::new("alice", "pasta", 60))
            .await
            .unwrap();
        assert!(!service.cancel_timer("bob", &timer.id).await.unwrap());
        assert!(service.cancel_timer("alice", &timer.id).await.unwrap());
        assert!(!service.cancel_timer("alice", &timer.id).await.unwrap());
        assert!(service.get_active_timers("alice").await.is_empty());
    }

    #[tokio::test]
    async fn drain_delivers_queued_notifications_once() {
        let db = test_database().await;
        let transport = MockTransport::new();
        let router = NotificationRouter::new(
            Arc::new(transport.clone()),
            Arc::new(MockDeviceRegistry::new()),
            Arc::new(zoe_storage::SqliteOfflineQueue::new(db.clone())),
        );
        let service = TimerService::new(db.clone(), router);

        let timer = timers::create_timer(
            &db,
            NewTimer::new("alice", "tea", 5).with_device("pad"),
            Utc::now() - ChronoDuration::seconds(10),
        )
        .await
        .unwrap();
        let summary = service.tick().await;
        assert!(summary.reports[0].offline_queued);

        assert_eq!(service.drain_offline("pad").await.unwrap(), 0);
        transport.connect("pad").await;
        assert_eq!(service.drain_offline("pad").await.unwrap(), 1);
        assert_eq!(service.drain_offline("pad").await.unwrap(), 0);

        assert_eq!(transport.delivered_devices().await, vec!["pad"]);
        let sent = transport.sent().await;
        assert!(sent.iter().any(|s| matches!(
            s,
            SentNotification::Device { notification, .. } if notification.timer_id == timer.id
        )));
    }
}
