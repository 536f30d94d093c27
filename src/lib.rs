pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod notify;
pub mod services;
pub mod storage;

use crate::config::AppConfig;
use crate::engine::gateway::{HandlerRegistry, TaskGateway};
use crate::engine::policy::{Clock, SystemClock};
use crate::engine::scheduler::{Scheduler, SchedulerConfig, SchedulerHandle};
use crate::notify::{Notifier, UpdateNotifier};
use crate::storage::Storage;
use anyhow::Result;
use std::sync::Arc;
use tracing::warn;

/// Core application state shared by the HTTP surface and the scheduler.
pub struct AppCore {
    pub storage: Arc<Storage>,
    pub clock: Arc<dyn Clock>,
    scheduler_handle: SchedulerHandle,
}

impl AppCore {
    /// Wire up storage, gateway, notifier, and the scheduler loop, and start
    /// the loop. Must be called from within a tokio runtime.
    pub fn new(config: &AppConfig, registry: HandlerRegistry) -> Result<Self> {
        let notifier: Arc<dyn Notifier> = Arc::new(UpdateNotifier::new(config.smtp.clone())?);
        Self::with_collaborators(config, registry, notifier, Arc::new(SystemClock))
    }

    /// Like [`AppCore::new`] but with injected notifier and clock.
    pub fn with_collaborators(
        config: &AppConfig,
        registry: HandlerRegistry,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        if registry.is_empty() {
            warn!("no task handlers registered, every due task will fail until handlers are wired");
        }

        let storage = Arc::new(Storage::new(&config.db_path)?);
        let gateway = Arc::new(TaskGateway::new(registry, config.task_timeout));
        let scheduler = Arc::new(Scheduler::new(
            storage.clone(),
            gateway,
            notifier,
            clock.clone(),
            SchedulerConfig {
                scan_interval: config.scan_interval,
            },
        ));
        let scheduler_handle = scheduler.start();

        Ok(Self {
            storage,
            clock,
            scheduler_handle,
        })
    }

    pub fn scheduler_handle(&self) -> &SchedulerHandle {
        &self.scheduler_handle
    }
}
