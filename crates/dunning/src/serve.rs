// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `dunning serve` and `dunning run-once`.
//!
//! Opens the SQLite store, builds the WhatsApp transport from config, and
//! wires both into the scheduler driver.

use std::sync::Arc;

use dunning_config::model::{DunningConfig, LogFormat, LoggingConfig};
use dunning_core::{DunningError, PluginAdapter, SystemClock};
use dunning_scheduler::{RunSummary, Scheduler, SchedulerDeps};
use dunning_storage::SqliteStore;
use dunning_whatsapp::WhatsAppTransport;
use tracing::{info, warn};

use crate::shutdown;

struct Services {
    store: Arc<SqliteStore>,
    transport: Arc<WhatsAppTransport>,
    scheduler: Scheduler,
}

impl Services {
    async fn build(config: &DunningConfig) -> Result<Self, DunningError> {
        let store = Arc::new(SqliteStore::open(&config.storage).await?);
        let transport = Arc::new(WhatsAppTransport::new(&config.transport)?);
        let scheduler = Scheduler::new(
            SchedulerDeps {
                settings: store.clone(),
                invoices: store.clone(),
                message_log: store.clone(),
                transport: transport.clone(),
                clock: Arc::new(SystemClock),
            },
            config,
        )?;
        Ok(Self {
            store,
            transport,
            scheduler,
        })
    }

    async fn shutdown(&self) {
        for adapter in [
            self.transport.as_ref() as &dyn PluginAdapter,
            self.store.as_ref() as &dyn PluginAdapter,
        ] {
            if let Err(e) = adapter.shutdown().await {
                warn!(adapter = adapter.name(), error = %e, "adapter shutdown failed");
            }
        }
    }
}

/// Runs the scheduler until SIGINT or SIGTERM.
pub async fn run_serve(config: DunningConfig) -> Result<(), DunningError> {
    if !config.scheduler.enabled {
        info!("scheduler.enabled is false; automatic reminders are off");
        return Ok(());
    }

    let mut services = Services::build(&config).await?;
    let cancel = shutdown::install_signal_handler();

    services.scheduler.start()?;
    info!(
        database = %config.storage.database_path,
        utc_offset_minutes = config.scheduler.utc_offset_minutes,
        max_concurrent_tenants = config.scheduler.max_concurrent_tenants,
        "dunning serving"
    );

    cancel.cancelled().await;
    services.scheduler.stop().await;
    services.shutdown().await;
    info!("dunning stopped");
    Ok(())
}

/// Executes one run immediately, regardless of `scheduler.enabled`.
pub async fn run_once(config: DunningConfig) -> Result<RunSummary, DunningError> {
    let services = Services::build(&config).await?;
    let summary = services.scheduler.run_once().await;
    services.shutdown().await;
    summary
}

/// Installs the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init_tracing(logging: &LoggingConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dunning={},warn", logging.level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
