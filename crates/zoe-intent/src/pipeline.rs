// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classify, execute, record.

use std::collections::HashMap;
use std::time::Instant;

use tracing::{debug, info, warn};

use zoe_core::{
    InputSource, IntentPattern, IntentRequest, IntentResult, MutableIntentTable, RequestOrigin,
    ZoeError,
};
use zoe_metrics::{IntentMetric, MAX_TIER, MetricsCollector};

use crate::classifier::PatternClassifier;
use crate::executor::IntentExecutor;

/// Intent name recorded when nothing matched.
pub const UNKNOWN_INTENT: &str = "unknown";

/// Reply used when no template matched.
pub const FALLBACK_REPLY: &str = "Sorry, I didn't understand that.";

/// What one pass through the pipeline produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    /// Matched intent, `None` on a miss.
    pub intent: Option<String>,
    pub tier: u8,
    pub result: IntentResult,
    pub latency_ms: f64,
}

/// Classifier, executor and metrics wired together.
#[derive(Clone, Default)]
pub struct IntentPipeline {
    classifier: PatternClassifier,
    executor: IntentExecutor,
    metrics: Option<MetricsCollector>,
}

impl std::fmt::Debug for IntentPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentPipeline")
            .field("classifier", &self.classifier)
            .field("executor", &self.executor)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

impl IntentPipeline {
    pub fn new(classifier: PatternClassifier, executor: IntentExecutor) -> Self {
        Self {
            classifier,
            executor,
            metrics: None,
        }
    }

    /// Record every processed request into `metrics`.
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn classifier(&self) -> &PatternClassifier {
        &self.classifier
    }

    pub fn executor(&self) -> &IntentExecutor {
        &self.executor
    }

    /// Handle one utterance with no device or room attached.
    pub async fn process(&self, user_id: &str, text: &str, source: InputSource) -> PipelineOutcome {
        self.process_from(user_id, text, source, RequestOrigin::default())
            .await
    }

    /// Handle one utterance end to end.
    ///
    /// Handler failures become a failed result rather than an error, so the
    /// caller always has something to reply with.
    pub async fn process_from(
        &self,
        user_id: &str,
        text: &str,
        source: InputSource,
        origin: RequestOrigin,
    ) -> PipelineOutcome {
        let started = Instant::now();

        let (intent, tier, confidence, result) = match self.classifier.classify(text) {
            Some(hit) => {
                let request = IntentRequest {
                    user_id: user_id.to_string(),
                    intent: hit.intent.clone(),
                    slots: hit.slots,
                    text: text.to_string(),
                    source,
                    origin,
                };
                let result = match self.executor.execute(&request).await {
                    Ok(result) => result,
                    Err(ZoeError::HandlerNotFound { intent }) => {
                        warn!(intent = %intent, "classified intent has no handler");
                        IntentResult::failed(format!("I know '{intent}' but can't do it yet."))
                    }
                    Err(e) => {
                        warn!(intent = %hit.intent, error = %e, "intent handler failed");
                        IntentResult::failed(format!("Something went wrong: {e}"))
                    }
                };
                (Some(hit.intent), hit.tier, hit.confidence, result)
            }
            None => {
                debug!(user_id, "no intent matched");
                (None, MAX_TIER, 0.0, IntentResult::failed(FALLBACK_REPLY))
            }
        };

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        info!(
            user_id,
            intent = intent.as_deref().unwrap_or(UNKNOWN_INTENT),
            tier,
            success = result.success,
            latency_ms,
            "intent processed"
        );

        if let Some(metrics) = &self.metrics {
            let metric = IntentMetric::new(user_id, intent.as_deref().unwrap_or(UNKNOWN_INTENT), tier)
                .confidence(confidence)
                .latency_ms(latency_ms)
                .success(result.success)
                .input(text, source);
            metrics.record_execution(&metric).await;
        }

        PipelineOutcome {
            intent,
            tier,
            result,
            latency_ms,
        }
    }
}

/// The pipeline exposes its classifier's table so module registration can
/// target a pipeline directly.
impl MutableIntentTable for IntentPipeline {
    fn ensure_table(&mut self) -> &mut HashMap<String, IntentPattern> {
        self.classifier.ensure_table()
    }

    fn intent(&self, name: &str) -> Option<&IntentPattern> {
        self.classifier.intent(name)
    }
}
