// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timer background service for the Zoe assistant.
//!
//! [`ExpiryScanner`] claims expired timers, [`NotificationRouter`] decides
//! which devices hear about them and [`TimerService`] runs both on a loop
//! alongside the registered callbacks. The built-in timer intents live in
//! [`handlers`].

pub mod callbacks;
pub mod handlers;
pub mod router;
pub mod scanner;
pub mod service;
pub mod transport;

pub use callbacks::{CallbackRegistry, LOG_CALLBACK_ID, LogCallback, TimerCallback, callback_fn};
pub use handlers::{TIMERS_MODULE, TimersModule, core_intents, format_duration, parse_duration};
pub use router::{
    DEFAULT_OFFLINE_TTL, NotificationRouter, RouteTier, RoutingContext, RoutingReport, TierOutcome,
    first_tier, next_tier,
};
pub use scanner::ExpiryScanner;
pub use service::{DEFAULT_CHECK_INTERVAL, TickSummary, TimerService};
pub use transport::ChannelTransport;
