// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Aggregated statistics for one run.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::cycle::{CycleOutcome, CycleReport, SkipReason};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub tenants_total: usize,
    /// Tenants whose invoices were selected and worked.
    pub tenants_processed: usize,
    pub tenants_skipped: usize,
    /// Tenants whose policy or invoices could not be read.
    pub tenants_failed: usize,
    pub reminders_sent: usize,
    pub failures: usize,
    /// Tenants stopped because credits ran out.
    pub budget_stops: usize,
    pub debit_warnings: usize,
    pub low_credit_tenants: usize,
    pub timed_out: bool,
    pub tenants: Vec<CycleReport>,
}

impl RunSummary {
    pub fn new(run_id: String, started_at: DateTime<Utc>, tenants_total: usize) -> Self {
        Self {
            run_id,
            started_at,
            finished_at: started_at,
            duration_ms: 0,
            tenants_total,
            tenants_processed: 0,
            tenants_skipped: 0,
            tenants_failed: 0,
            reminders_sent: 0,
            failures: 0,
            budget_stops: 0,
            debit_warnings: 0,
            low_credit_tenants: 0,
            timed_out: false,
            tenants: Vec::new(),
        }
    }

    /// Folds one tenant's report into the totals.
    pub fn record(&mut self, report: CycleReport) {
        match report.outcome {
            CycleOutcome::Skipped(SkipReason::RunDeadline) => {
                self.tenants_skipped += 1;
                self.timed_out = true;
            }
            CycleOutcome::Skipped(_) => self.tenants_skipped += 1,
            CycleOutcome::Completed | CycleOutcome::Stopped(_) => self.tenants_processed += 1,
            CycleOutcome::BudgetExhausted => {
                self.tenants_processed += 1;
                self.budget_stops += 1;
            }
            CycleOutcome::TimedOut => {
                self.tenants_processed += 1;
                self.timed_out = true;
            }
        }
        self.reminders_sent += report.sent;
        self.failures += report.failed;
        self.debit_warnings += report.debit_warnings;
        if report.low_credit {
            self.low_credit_tenants += 1;
        }
        self.tenants.push(report);
    }

    pub fn record_failure(&mut self) {
        self.tenants_failed += 1;
    }

    pub fn finish(&mut self, finished_at: DateTime<Utc>, elapsed: Duration) {
        self.finished_at = finished_at;
        self.duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.tenants.sort_by(|a, b| a.tenant_id.cmp(&b.tenant_id));
    }

    pub fn log(&self) {
        info!(
            run_id = %self.run_id,
            tenants = self.tenants_total,
            processed = self.tenants_processed,
            skipped = self.tenants_skipped,
            tenant_errors = self.tenants_failed,
            sent = self.reminders_sent,
            failures = self.failures,
            budget_stops = self.budget_stops,
            debit_warnings = self.debit_warnings,
            low_credit_tenants = self.low_credit_tenants,
            timed_out = self.timed_out,
            duration_ms = self.duration_ms,
            "reminder run finished"
        );
    }
}
