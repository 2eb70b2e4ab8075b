// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic scheduler driver.
//!
//! Fires the reminder run on the configured cron schedule, evaluated in the
//! business timezone, and fans tenant cycles out with bounded concurrency.
//! A scheduled run is judged at its fire time, not at the instant the timer
//! woke, so a late wake-up cannot push it into the following hour.
//! A run is bounded by `run_timeout_secs`: tenants not yet started when the
//! deadline passes are skipped, and in-flight dispatches finish.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use croner::Cron;
use dunning_config::{DunningConfig, check_hourly_schedule, parse_schedule};
use dunning_core::{
    Clock, DunningError, InvoiceStore, MessageLogStore, MessageTransport, TenantSettingsStore,
};
use dunning_credit::CreditGate;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::cycle::TenantCycle;
use crate::dispatch::Dispatcher;
use crate::selector::OverdueInvoiceSelector;
use crate::summary::RunSummary;

/// Collaborators the driver wires into each tenant cycle.
#[derive(Clone)]
pub struct SchedulerDeps {
    pub settings: Arc<dyn TenantSettingsStore>,
    pub invoices: Arc<dyn InvoiceStore>,
    pub message_log: Arc<dyn MessageLogStore>,
    pub transport: Arc<dyn MessageTransport>,
    pub clock: Arc<dyn Clock>,
}

struct Runner {
    settings: Arc<dyn TenantSettingsStore>,
    cycle: TenantCycle,
    clock: Arc<dyn Clock>,
    max_concurrent: usize,
    run_timeout: Duration,
}

impl Runner {
    /// Runs every active tenant with windows evaluated at `as_of`.
    async fn run(&self, as_of: DateTime<Utc>) -> Result<RunSummary, DunningError> {
        let started = std::time::Instant::now();
        let deadline = tokio::time::Instant::now() + self.run_timeout;
        let run_id = Uuid::new_v4().to_string();

        let tenants = self.settings.list_active_tenants().await?;
        info!(run_id = %run_id, tenants = tenants.len(), as_of = %as_of, "reminder run started");

        let mut summary = RunSummary::new(run_id, self.clock.now(), tenants.len());
        let results: Vec<_> = futures::stream::iter(tenants)
            .map(|tenant| {
                let cycle = self.cycle.clone();
                async move {
                    let result = cycle.run(&tenant, as_of, Some(deadline)).await;
                    (tenant, result)
                }
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        for (tenant, result) in results {
            match result {
                Ok(report) => summary.record(report),
                Err(e) => {
                    error!(tenant_id = %tenant.id, error = %e, "tenant cycle failed");
                    summary.record_failure();
                }
            }
        }

        summary.finish(self.clock.now(), started.elapsed());
        if summary.timed_out {
            warn!(
                run_id = %summary.run_id,
                timeout_secs = self.run_timeout.as_secs(),
                "reminder run hit its deadline"
            );
        }
        summary.log();
        Ok(summary)
    }
}

/// Drives reminder runs on a cron schedule.
pub struct Scheduler {
    runner: Arc<Runner>,
    schedule: String,
    cron: Arc<Cron>,
    offset: FixedOffset,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Builds the driver. Fails if the schedule does not parse or does not
    /// fire exactly once per hour.
    pub fn new(deps: SchedulerDeps, config: &DunningConfig) -> Result<Self, DunningError> {
        let schedule = config.scheduler.schedule.trim().to_string();
        let cron = parse_schedule(&schedule).map_err(|reason| {
            DunningError::Config(format!("invalid scheduler.schedule '{schedule}': {reason}"))
        })?;
        check_hourly_schedule(&schedule).map_err(DunningError::Config)?;

        let offset = config.scheduler.business_offset();
        let dispatcher = Dispatcher::new(
            CreditGate::new(deps.settings.clone()),
            deps.message_log,
            deps.transport,
            deps.clock.clone(),
            config,
        );
        let cycle = TenantCycle::new(
            deps.settings.clone(),
            OverdueInvoiceSelector::new(deps.invoices),
            dispatcher,
            offset,
        );

        Ok(Self {
            runner: Arc::new(Runner {
                settings: deps.settings,
                cycle,
                clock: deps.clock,
                max_concurrent: config.scheduler.max_concurrent_tenants.max(1),
                run_timeout: Duration::from_secs(config.scheduler.run_timeout_secs),
            }),
            schedule,
            cron: Arc::new(cron),
            offset,
            cancel: CancellationToken::new(),
            task: None,
        })
    }

    /// Runs every active tenant once, immediately, as of the clock's now.
    ///
    /// Fails only when the tenant list cannot be read; per-tenant errors are
    /// counted in the summary.
    pub async fn run_once(&self) -> Result<RunSummary, DunningError> {
        self.runner.run(self.runner.clock.now()).await
    }

    /// First fire time strictly after `after`.
    pub fn next_run_after(&self, after: DateTime<Utc>) -> Result<DateTime<Utc>, DunningError> {
        next_fire(&self.cron, self.offset, after)
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Spawns the background loop. Runs never overlap: the next fire time is
    /// computed after the previous run returns, and is always later than the
    /// fire time just run.
    pub fn start(&mut self) -> Result<(), DunningError> {
        if self.is_running() {
            return Err(DunningError::Internal("scheduler already started".into()));
        }

        let first = self.next_run_after(self.runner.clock.now())?;
        info!(schedule = %self.schedule, next_run = %first, "scheduler started");

        self.cancel = CancellationToken::new();
        let cancel = self.cancel.clone();
        let runner = self.runner.clone();
        let cron = self.cron.clone();
        let offset = self.offset;

        self.task = Some(tokio::spawn(async move {
            let mut last_fire: Option<DateTime<Utc>> = None;
            loop {
                let now = runner.clock.now();
                let next = match next_tick(&cron, offset, now, last_fire) {
                    Ok(next) => next,
                    Err(e) => {
                        error!(error = %e, "no next fire time; scheduler stopping");
                        break;
                    }
                };
                let wait = (next - now).to_std().unwrap_or(Duration::ZERO);

                tokio::select! {
                    _ = tokio::time::sleep(wait) => {
                        last_fire = Some(next);
                        if let Err(e) = runner.run(next).await {
                            error!(error = %e, scheduled_for = %next, "reminder run failed");
                        }
                    }
                    _ = cancel.cancelled() => {
                        info!("scheduler shutting down");
                        break;
                    }
                }
            }
        }));
        Ok(())
    }

    /// Stops the loop and waits for an in-flight run to return.
    pub async fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take()
            && let Err(e) = task.await
        {
            error!(error = %e, "scheduler task ended abnormally");
        }
    }
}

fn next_fire(
    cron: &Cron,
    offset: FixedOffset,
    after: DateTime<Utc>,
) -> Result<DateTime<Utc>, DunningError> {
    cron.find_next_occurrence(&after.with_timezone(&offset), false)
        .map(|next| next.with_timezone(&Utc))
        .map_err(|e| DunningError::Internal(format!("schedule has no next occurrence: {e}")))
}

/// Next fire time for the loop. Never returns `last` again, even when the
/// clock reads earlier than the tick just run.
fn next_tick(
    cron: &Cron,
    offset: FixedOffset,
    now: DateTime<Utc>,
    last: Option<DateTime<Utc>>,
) -> Result<DateTime<Utc>, DunningError> {
    let after = last.map_or(now, |last| last.max(now));
    next_fire(cron, offset, after)
}
