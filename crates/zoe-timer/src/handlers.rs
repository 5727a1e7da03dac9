// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in timer intents and their handlers.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use zoe_core::{
    ActiveTimer, IntentHandler, IntentPattern, IntentRequest, IntentResult, MAX_TIMER_SECONDS,
    ModuleDescriptor, NewTimer, ZoeError,
};

use crate::service::TimerService;

/// Name of the compiled-in descriptor.
pub const TIMERS_MODULE: &str = "timers";

const TIMER_INTENTS: &str = include_str!("../intents/timers.toml");

const DEFAULT_LABEL: &str = "timer";

/// Parse the built-in timer intent definitions.
pub fn core_intents() -> Result<BTreeMap<String, IntentPattern>, ZoeError> {
    let table: toml::Table = toml::from_str(TIMER_INTENTS)
        .map_err(|e| ZoeError::Internal(format!("built-in timer intents: {e}")))?;
    match table.get("intents") {
        Some(toml::Value::Table(intents)) => Ok(intents
            .iter()
            .map(|(name, pattern)| (name.clone(), IntentPattern(pattern.clone())))
            .collect()),
        _ => Err(ZoeError::Internal(
            "built-in timer intents: missing `intents` table".into(),
        )),
    }
}

/// Parse a spoken duration such as `10 minutes`, `1 hour and 30 minutes`,
/// `an hour` or `90s` into seconds.
///
/// A bare number counts as minutes. Amounts that overflow `i64` are
/// rejected like any other unparseable duration.
pub fn parse_duration(text: &str) -> Option<i64> {
    let mut total: i64 = 0;
    let mut pending: Option<i64> = None;
    let mut matched = false;

    for raw in text.split_whitespace() {
        let word = raw.trim_end_matches([',', '.']).to_lowercase();
        if word == "and" {
            continue;
        }
        if let Some(unit) = unit_seconds(&word) {
            total = total.checked_add(pending.take()?.checked_mul(unit)?)?;
            matched = true;
        } else if let Some(n) = number(&word) {
            if let Some(previous) = pending.replace(n) {
                total = total.checked_add(previous.checked_mul(60)?)?;
            }
        } else {
            let split = word.find(|c: char| !c.is_ascii_digit())?;
            let (digits, unit) = word.split_at(split);
            let n: i64 = digits.parse().ok()?;
            total = total.checked_add(n.checked_mul(unit_seconds(unit)?)?)?;
            matched = true;
        }
    }

    if let Some(minutes) = pending {
        total = total.checked_add(minutes.checked_mul(60)?)?;
        matched = true;
    }
    (matched && total > 0).then_some(total)
}

fn unit_seconds(word: &str) -> Option<i64> {
    match word {
        "s" | "sec" | "secs" | "second" | "seconds" => Some(1),
        "m" | "min" | "mins" | "minute" | "minutes" => Some(60),
        "h" | "hr" | "hrs" | "hour" | "hours" => Some(3600),
        _ => None,
    }
}

fn number(word: &str) -> Option<i64> {
    if let Ok(n) = word.parse::<i64>() {
        return Some(n);
    }
    let n = match word {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "ten" => 10,
        "fifteen" => 15,
        "twenty" => 20,
        "thirty" => 30,
        "forty" => 40,
        "fifty" => 50,
        _ => return None,
    };
    Some(n)
}

/// Render seconds the way replies read them, e.g. `1 hour 5 minutes`.
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let (hours, minutes, secs) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    let mut parts = Vec::new();
    for (n, unit) in [(hours, "hour"), (minutes, "minute"), (secs, "second")] {
        if n > 0 {
            parts.push(format!("{n} {unit}{}", if n == 1 { "" } else { "s" }));
        }
    }
    if parts.is_empty() {
        "0 seconds".to_string()
    } else {
        parts.join(" ")
    }
}

fn label_of(request: &IntentRequest) -> Option<String> {
    request
        .slot("label")
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_lowercase)
}

/// `StartTimer`: create a timer routed back to where it was asked for.
pub struct StartTimerHandler {
    service: Arc<TimerService>,
}

#[async_trait]
impl IntentHandler for StartTimerHandler {
    async fn handle(&self, request: &IntentRequest) -> Result<IntentResult, ZoeError> {
        let Some(seconds) = request.slot("duration").and_then(parse_duration) else {
            return Ok(IntentResult::failed("How long should the timer run?"));
        };
        if seconds > MAX_TIMER_SECONDS {
            return Ok(IntentResult::failed(format!(
                "Timers can run for at most {}.",
                format_duration(MAX_TIMER_SECONDS)
            )));
        }
        let label = label_of(request).unwrap_or_else(|| DEFAULT_LABEL.to_string());

        let mut new = NewTimer::new(&request.user_id, &label, seconds);
        new.source_device_id = request.origin.device_id.clone();
        new.source_session_id = request.origin.session_id.clone();
        new.source_room = request.origin.room.clone();

        let timer = self.service.create_timer(new).await?;
        Ok(IntentResult::ok(format!(
            "Timer '{}' set for {}.",
            timer.label,
            format_duration(seconds)
        ))
        .with_data(json!({
            "timer_id": timer.id,
            "expires_at": timer.expires_at,
        })))
    }
}

/// `CancelTimer`: cancel the only running timer, or the one named by label.
pub struct CancelTimerHandler {
    service: Arc<TimerService>,
}

#[async_trait]
impl IntentHandler for CancelTimerHandler {
    async fn handle(&self, request: &IntentRequest) -> Result<IntentResult, ZoeError> {
        let active = self.service.get_active_timers(&request.user_id).await;
        let label = label_of(request);
        let candidates: Vec<&ActiveTimer> = active
            .iter()
            .filter(|a| label.as_ref().is_none_or(|l| a.timer.label.eq_ignore_ascii_case(l)))
            .collect();

        let target = match (candidates.as_slice(), &label) {
            ([], None) => return Ok(IntentResult::failed("You don't have any timers running.")),
            ([], Some(label)) => {
                return Ok(IntentResult::failed(format!("There's no '{label}' timer running.")));
            }
            ([only], _) => *only,
            (many, _) => {
                return Ok(IntentResult::failed(format!(
                    "You have {} timers running. Which one should I cancel?",
                    many.len()
                )));
            }
        };

        if self
            .service
            .cancel_timer(&request.user_id, &target.timer.id)
            .await?
        {
            Ok(IntentResult::ok(format!("Cancelled the '{}' timer.", target.timer.label))
                .with_data(json!({ "timer_id": target.timer.id })))
        } else {
            Ok(IntentResult::failed("That timer already finished."))
        }
    }
}

/// `TimerStatus`: list running timers with their remaining time.
pub struct TimerStatusHandler {
    service: Arc<TimerService>,
}

#[async_trait]
impl IntentHandler for TimerStatusHandler {
    async fn handle(&self, request: &IntentRequest) -> Result<IntentResult, ZoeError> {
        let active = self.service.get_active_timers(&request.user_id).await;
        if active.is_empty() {
            return Ok(IntentResult::ok("You don't have any timers running."));
        }

        let lines: Vec<String> = active
            .iter()
            .map(|a| format!("{}: {} left", a.timer.label, format_duration(a.remaining_seconds)))
            .collect();
        Ok(IntentResult::ok(lines.join("\n")).with_data(json!({
            "timers": active
                .iter()
                .map(|a| json!({
                    "timer_id": a.timer.id,
                    "label": a.timer.label,
                    "remaining_seconds": a.remaining_seconds,
                }))
                .collect::<Vec<_>>(),
        })))
    }
}

/// Descriptor exposing the timer handlers.
pub struct TimersModule {
    service: Arc<TimerService>,
}

impl TimersModule {
    pub fn new(service: Arc<TimerService>) -> Self {
        Self { service }
    }
}

impl ModuleDescriptor for TimersModule {
    fn name(&self) -> &str {
        TIMERS_MODULE
    }

    fn description(&self) -> &str {
        "Countdown timers with multi-device alerts"
    }

    fn intent_handlers(&self) -> HashMap<String, Arc<dyn IntentHandler>> {
        let start: Arc<dyn IntentHandler> = Arc::new(StartTimerHandler {
            service: Arc::clone(&self.service),
        });
        let cancel: Arc<dyn IntentHandler> = Arc::new(CancelTimerHandler {
            service: Arc::clone(&self.service),
        });
        let status: Arc<dyn IntentHandler> = Arc::new(TimerStatusHandler {
            service: Arc::clone(&self.service),
        });
        HashMap::from([
            ("StartTimer".to_string(), start),
            ("CancelTimer".to_string(), cancel),
            ("TimerStatus".to_string(), status),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zoe_core::RequestOrigin;
    use zoe_test_utils::{MockDeviceRegistry, MockOfflineSink, MockTransport, test_database};

    use crate::router::NotificationRouter;

    #[test]
    fn durations_parse() {
        assert_eq!(parse_duration("10 minutes"), Some(600));
        assert_eq!(parse_duration("1 hour and 30 minutes"), Some(5400));
        assert_eq!(parse_duration("an hour"), Some(3600));
        assert_eq!(parse_duration("90s"), Some(90));
        assert_eq!(parse_duration("2h 15m"), Some(8100));
        assert_eq!(parse_duration("5"), Some(300));
        assert_eq!(parse_duration("thirty seconds"), Some(30));
    }

    #[test]
    fn bad_durations_are_rejected() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("minutes"), None);
        assert_eq!(parse_duration("a while"), None);
        assert_eq!(parse_duration("0 seconds"), None);
        assert_eq!(parse_duration("10 fortnights"), None);
    }

    #[test]
    fn overflowing_durations_are_rejected() {
        assert_eq!(parse_duration("99999999999999999 hours"), None);
        assert_eq!(parse_duration("9223372036854775807s and 1s"), None);
        assert_eq!(parse_duration("999999999999999999 minutes"), None);
    }

    #[test]
    fn durations_format() {
        assert_eq!(format_duration(0), "0 seconds");
        assert_eq!(format_duration(61), "1 minute 1 second");
        assert_eq!(format_duration(3900), "1 hour 5 minutes");
    }

    #[test]
    fn core_intents_parse() {
        let intents = core_intents().unwrap();
        let names: Vec<_> = intents.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["CancelTimer", "StartTimer", "TimerStatus"]);
        assert!(!intents["StartTimer"].sentences().is_empty());
    }

    async fn module() -> (TimersModule, Arc<TimerService>) {
        let router = NotificationRouter::new(
            Arc::new(MockTransport::new()),
            Arc::new(MockDeviceRegistry::new()),
            Arc::new(MockOfflineSink::new()),
        );
        let service = Arc::new(TimerService::new(test_database().await, router));
        (TimersModule::new(Arc::clone(&service)), service)
    }

    fn request(intent: &str) -> IntentRequest {
        IntentRequest::new("alice", intent)
    }

    #[tokio::test]
    async fn start_status_cancel_flow() {
        let (module, service) = module().await;
        let handlers = module.intent_handlers();

        let started = handlers["StartTimer"]
            .handle(
                &request("StartTimer")
                    .with_slot("duration", "10 minutes")
                    .with_slot("label", "Pasta")
                    .with_origin(RequestOrigin {
                        device_id: Some("kitchen-pad".into()),
                        session_id: None,
                        room: Some("kitchen".into()),
                    }),
            )
            .await
            .unwrap();
        assert!(started.success);
        assert_eq!(started.message, "Timer 'pasta' set for 10 minutes.");

        let active = service.get_active_timers("alice").await;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].timer.source_device_id.as_deref(), Some("kitchen-pad"));
        assert_eq!(active[0].timer.source_room.as_deref(), Some("kitchen"));

        let status = handlers["TimerStatus"].handle(&request("TimerStatus")).await.unwrap();
        assert!(status.message.starts_with("pasta: "));

        let cancelled = handlers["CancelTimer"].handle(&request("CancelTimer")).await.unwrap();
        assert!(cancelled.success);
        assert!(service.get_active_timers("alice").await.is_empty());
    }

    #[tokio::test]
    async fn start_without_duration_asks_back() {
        let (module, _) = module().await;
        let result = module.intent_handlers()["StartTimer"]
            .handle(&request("StartTimer"))
            .await
            .unwrap();
        assert!(!result.success);
    }

    #[tokio::test]
    async fn start_beyond_a_week_is_refused() {
        let (module, service) = module().await;
        let handlers = module.intent_handlers();
        for duration in ["999999999999 hours", "169 hours", "99999999999999999 hours"] {
            let result = handlers["StartTimer"]
                .handle(&request("StartTimer").with_slot("duration", duration))
                .await
                .unwrap();
            assert!(!result.success, "{duration}");
        }
        assert!(service.get_active_timers("alice").await.is_empty());
    }

    #[tokio::test]
    async fn cancel_needs_a_label_when_ambiguous() {
        let (module, service) = module().await;
        service.create_timer(NewTimer::new("alice", "pasta", 600)).await.unwrap();
        service.create_timer(NewTimer::new("alice", "eggs", 300)).await.unwrap();
        let handlers = module.intent_handlers();
        let cancel = &handlers["CancelTimer"];

        let result = cancel.handle(&request("CancelTimer")).await.unwrap();
        assert!(!result.success);

        let result = cancel
            .handle(&request("CancelTimer").with_slot("label", "eggs"))
            .await
            .unwrap();
        assert!(result.success);
        let left = service.get_active_timers("alice").await;
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].timer.label, "pasta");
    }
}
