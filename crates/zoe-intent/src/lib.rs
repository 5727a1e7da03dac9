// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intent classification and dispatch for the Zoe assistant.
//!
//! [`PatternClassifier`] maps an utterance to an intent, [`IntentExecutor`]
//! runs the handler registered for it and [`IntentPipeline`] ties both to the
//! metrics collector.

pub mod classifier;
pub mod executor;
pub mod pipeline;

pub use classifier::{Classification, PATTERN_TIER, PatternClassifier};
pub use executor::IntentExecutor;
pub use pipeline::{FALLBACK_REPLY, IntentPipeline, PipelineOutcome, UNKNOWN_INTENT};
