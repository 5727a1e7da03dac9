// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expiry callbacks.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{error, info, warn};

use zoe_core::{Timer, ZoeError};

/// Id of the callback registered by default.
pub const LOG_CALLBACK_ID: &str = "log";

/// Something that wants to hear about every expired timer.
#[async_trait]
pub trait TimerCallback: Send + Sync {
    async fn on_expired(&self, user_id: &str, timer: &Timer) -> Result<(), ZoeError>;
}

/// Logs each expiry at `info`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogCallback;

#[async_trait]
impl TimerCallback for LogCallback {
    async fn on_expired(&self, user_id: &str, timer: &Timer) -> Result<(), ZoeError> {
        info!(
            user_id,
            timer_id = %timer.id,
            label = %timer.label,
            duration_seconds = timer.duration_seconds,
            "timer expired"
        );
        Ok(())
    }
}

/// Adapter turning an async closure into a [`TimerCallback`].
pub struct FnCallback<F>(F);

#[async_trait]
impl<F, Fut> TimerCallback for FnCallback<F>
where
    F: Fn(String, Timer) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ZoeError>> + Send + 'static,
{
    async fn on_expired(&self, user_id: &str, timer: &Timer) -> Result<(), ZoeError> {
        (self.0)(user_id.to_string(), timer.clone()).await
    }
}

/// Wrap an async closure as a shareable callback.
pub fn callback_fn<F, Fut>(f: F) -> Arc<dyn TimerCallback>
where
    F: Fn(String, Timer) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ZoeError>> + Send + 'static,
{
    Arc::new(FnCallback(f))
}

/// Ordered id → callback table.
///
/// Re-registering an id replaces the callback but keeps its original
/// position. The lock is only held to copy the table out, never across an
/// await.
#[derive(Default)]
pub struct CallbackRegistry {
    entries: RwLock<Vec<(String, Arc<dyn TimerCallback>)>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: &str, callback: Arc<dyn TimerCallback>) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.iter_mut().find(|(existing, _)| existing == id) {
            Some(slot) => slot.1 = callback,
            None => entries.push((id.to_string(), callback)),
        }
    }

    /// Returns whether the id was registered.
    pub fn unregister(&self, id: &str) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|(existing, _)| existing != id);
        entries.len() != before
    }

    /// Registered ids in invocation order.
    pub fn ids(&self) -> Vec<String> {
        self.snapshot().into_iter().map(|(id, _)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Vec<(String, Arc<dyn TimerCallback>)> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run every callback for `timer` in order.
    ///
    /// An error or panic in one callback is logged and does not stop the
    /// rest. Returns how many callbacks failed.
    pub async fn dispatch(&self, timer: &Timer) -> usize {
        let mut failures = 0;
        for (id, callback) in self.snapshot() {
            let call = AssertUnwindSafe(callback.on_expired(&timer.user_id, timer));
            match call.catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(callback = %id, timer_id = %timer.id, error = %e, "timer callback failed");
                    failures += 1;
                    zoe_metrics::recording::record_callback_failure(&id);
                }
                Err(_) => {
                    error!(callback = %id, timer_id = %timer.id, "timer callback panicked");
                    failures += 1;
                    zoe_metrics::recording::record_callback_failure(&id);
                }
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::Utc;

    fn timer() -> Timer {
        let now = Utc::now();
        Timer {
            id: "t-1".into(),
            user_id: "alice".into(),
            label: "eggs".into(),
            duration_seconds: 1,
            created_at: now,
            expires_at: now,
            completed: true,
            cancelled: false,
            source_device_id: None,
            source_session_id: None,
            source_room: None,
        }
    }

    struct Panicking;

    #[async_trait]
    impl TimerCallback for Panicking {
        async fn on_expired(&self, _user_id: &str, _timer: &Timer) -> Result<(), ZoeError> {
            panic!("callback blew up")
        }
    }

    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &'static str) -> Arc<dyn TimerCallback> {
        let log = Arc::clone(log);
        callback_fn(move |_user, _timer| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(tag.to_string());
                Ok(())
            }
        })
    }

    #[tokio::test]
    async fn replacement_keeps_position() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = CallbackRegistry::new();
        registry.register("a", recorder(&log, "a1"));
        registry.register("b", recorder(&log, "b"));
        registry.register("a", recorder(&log, "a2"));

        assert_eq!(registry.ids(), vec!["a", "b"]);
        registry.dispatch(&timer()).await;
        assert_eq!(*log.lock().unwrap(), vec!["a2", "b"]);
    }

    #[tokio::test]
    async fn unregistering_unknown_id_is_a_no_op() {
        let registry = CallbackRegistry::new();
        registry.register(LOG_CALLBACK_ID, Arc::new(LogCallback));
        assert!(!registry.unregister("nope"));
        assert_eq!(registry.len(), 1);
        assert!(registry.unregister(LOG_CALLBACK_ID));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn errors_and_panics_are_isolated() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let registry = CallbackRegistry::new();
        registry.register(
            "err",
            callback_fn(|_, _| async { Err::<(), _>(ZoeError::Internal("nope".into())) }),
        );
        registry.register("panic", Arc::new(Panicking));
        registry.register("ok", recorder(&log, "ok"));

        assert_eq!(registry.dispatch(&timer()).await, 2);
        assert_eq!(*log.lock().unwrap(), vec!["ok"]);
    }
}
