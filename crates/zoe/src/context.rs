// SPDX-FileCopyrightText: 2026 Zoe Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Application context shared by every subcommand.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use zoe_config::ZoeConfig;
use zoe_core::{HandlerRegistry, ModuleDescriptor, MutableIntentTable, ZoeError};
use zoe_intent::{IntentExecutor, IntentPipeline, PatternClassifier};
use zoe_metrics::MetricsCollector;
use zoe_modules::{ModuleCatalog, ModuleLoader, integrate_module_intents};
use zoe_storage::{Database, SqliteDeviceRegistry, SqliteOfflineQueue};
use zoe_timer::{ChannelTransport, NotificationRouter, TimerService, TimersModule, core_intents};

/// Device id used by the interactive console session.
pub const CONSOLE_DEVICE: &str = "console";

/// Everything a running Zoe process owns.
///
/// The metrics collector and the intent pipeline are created on first use,
/// so commands that never classify anything don't pay for module loading.
pub struct AppContext {
    config: ZoeConfig,
    db: Database,
    transport: ChannelTransport,
    timers: Arc<TimerService>,
    loader: ModuleLoader,
    metrics: OnceCell<MetricsCollector>,
    pipeline: OnceCell<IntentPipeline>,
}

impl AppContext {
    /// Open the configured database and wire the services around it.
    pub async fn build(config: ZoeConfig) -> Result<Self, ZoeError> {
        let db = Database::open_with_config(&config.storage).await?;
        Ok(Self::with_database(config, db))
    }

    /// Wire the services around an already open database.
    pub fn with_database(config: ZoeConfig, db: Database) -> Self {
        let transport = ChannelTransport::new();
        let router = NotificationRouter::new(
            Arc::new(transport.clone()),
            Arc::new(SqliteDeviceRegistry::new(db.clone())),
            Arc::new(SqliteOfflineQueue::new(db.clone())),
        );
        let timers = Arc::new(TimerService::from_config(
            &config.timers,
            db.clone(),
            router,
        ));

        // Module directories may bind their own phrasings to the timer handlers.
        let catalog =
            ModuleCatalog::new().with(Arc::new(TimersModule::new(Arc::clone(&timers))));
        let loader = ModuleLoader::from_config(&config.modules, catalog);

        Self {
            config,
            db,
            transport,
            timers,
            loader,
            metrics: OnceCell::new(),
            pipeline: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &ZoeConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn transport(&self) -> &ChannelTransport {
        &self.transport
    }

    pub fn timers(&self) -> &Arc<TimerService> {
        &self.timers
    }

    pub fn loader(&self) -> &ModuleLoader {
        &self.loader
    }

    /// The intent metrics collector, created on first access.
    pub async fn metrics_collector(&self) -> &MetricsCollector {
        self.metrics
            .get_or_init(|| async {
                debug!("metrics collector initialised");
                MetricsCollector::new(self.db.clone())
                    .with_top_intents_limit(self.config.metrics.top_intents_limit)
            })
            .await
    }

    /// The intent pipeline, assembled on first access.
    ///
    /// Fails when the module enablement file exists but can't be read.
    pub async fn pipeline(&self) -> Result<&IntentPipeline, ZoeError> {
        self.pipeline
            .get_or_try_init(|| async {
                let pipeline = build_pipeline(&self.loader, Arc::clone(&self.timers))?;
                let metrics = self.metrics_collector().await.clone();
                Ok::<_, ZoeError>(pipeline.with_metrics(metrics))
            })
            .await
    }

    /// Stop the timer loop and close the database.
    pub async fn shutdown(self) -> Result<(), ZoeError> {
        self.timers.stop().await;
        let Self { db, .. } = self;
        db.close().await?;
        info!("zoe stopped");
        Ok(())
    }
}

/// Build a pipeline holding the built-in timer intents plus every enabled
/// module.
///
/// Core intents go in first, so a module redefining one of them is reported
/// as a conflict.
pub fn build_pipeline(
    loader: &ModuleLoader,
    timers: Arc<TimerService>,
) -> Result<IntentPipeline, ZoeError> {
    let mut classifier = PatternClassifier::new();
    let mut executor = IntentExecutor::new();

    let core = core_intents()?;
    let core_count = core.len();
    for (name, pattern) in core {
        classifier.upsert_intent(&name, pattern);
    }
    for (intent, handler) in TimersModule::new(timers).intent_handlers() {
        executor.register_handler(&intent, handler);
    }

    let modules = integrate_module_intents(loader, &mut classifier, &mut executor)?;
    info!(
        core_intents = core_count,
        modules,
        handlers = executor.len(),
        "intent pipeline ready"
    );
    Ok(IntentPipeline::new(classifier, executor))
}
