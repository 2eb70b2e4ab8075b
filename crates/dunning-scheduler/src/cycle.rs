// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant cycle orchestration.
//!
//! One cycle walks a tenant through the policy switches, the send window, and
//! a balance liveness check, then dispatches every overdue invoice in order:
//! sales first, then purchases, oldest first within each. Running out of
//! credit stops the cycle at once; any other per-invoice failure is counted
//! and the next invoice is tried.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use dunning_core::{DunningError, ErrorClass, Tenant, TenantId, TenantSettingsStore};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::dispatch::Dispatcher;
use crate::selector::OverdueInvoiceSelector;
use crate::window::{self, WindowVeto};

/// Why a tenant's cycle ended early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    MessagingDisabled,
    SchedulerDisabled,
    Window(WindowVeto),
    NoCredits { balance: i64 },
    RunDeadline,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MessagingDisabled => f.write_str("messaging disabled"),
            Self::SchedulerDisabled => f.write_str("automatic reminders disabled"),
            Self::Window(veto) => write!(f, "{veto}"),
            Self::NoCredits { balance } => write!(f, "no credits (balance {balance})"),
            Self::RunDeadline => f.write_str("run deadline reached"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleOutcome {
    /// Ended before any invoice was attempted.
    Skipped(SkipReason),
    /// A tenant switch flipped after at least one invoice was worked.
    Stopped(SkipReason),
    /// Every selected invoice was handled.
    Completed,
    /// Credits ran out; the rest of the queue waits for the next run.
    BudgetExhausted,
    /// The run deadline passed mid-queue.
    TimedOut,
}

/// Per-tenant result of one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub tenant_id: TenantId,
    pub outcome: CycleOutcome,
    pub sent: usize,
    /// Transport rejections and invalid recipients.
    pub failed: usize,
    /// Invoices skipped for configuration reasons, such as a missing template.
    pub skipped: usize,
    /// Selected invoices never attempted in this cycle.
    pub untouched: usize,
    /// Sends whose credit debit failed afterwards.
    pub debit_warnings: usize,
    pub low_credit: bool,
}

impl CycleReport {
    fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            outcome: CycleOutcome::Completed,
            sent: 0,
            failed: 0,
            skipped: 0,
            untouched: 0,
            debit_warnings: 0,
            low_credit: false,
        }
    }

    fn skipped(tenant_id: TenantId, reason: SkipReason) -> Self {
        Self {
            outcome: CycleOutcome::Skipped(reason),
            ..Self::new(tenant_id)
        }
    }
}

/// Runs the per-tenant state machine.
#[derive(Clone)]
pub struct TenantCycle {
    settings: Arc<dyn TenantSettingsStore>,
    selector: OverdueInvoiceSelector,
    dispatcher: Dispatcher,
    offset: FixedOffset,
}

impl TenantCycle {
    pub fn new(
        settings: Arc<dyn TenantSettingsStore>,
        selector: OverdueInvoiceSelector,
        dispatcher: Dispatcher,
        offset: FixedOffset,
    ) -> Self {
        Self {
            settings,
            selector,
            dispatcher,
            offset,
        }
    }

    /// Runs one cycle for `tenant` as of `now`.
    ///
    /// Errors only when the tenant's policy or invoices cannot be read.
    /// Per-invoice failures are folded into the report.
    pub async fn run(
        &self,
        tenant: &Tenant,
        now: DateTime<Utc>,
        deadline: Option<Instant>,
    ) -> Result<CycleReport, DunningError> {
        let tenant_id = tenant.id.clone();

        if deadline_passed(deadline) {
            return Ok(self.skip(tenant_id, SkipReason::RunDeadline));
        }

        let policy = self.settings.messaging_policy(&tenant.id).await?;
        if !policy.enabled {
            return Ok(self.skip(tenant_id, SkipReason::MessagingDisabled));
        }
        if !policy.scheduler.enabled {
            return Ok(self.skip(tenant_id, SkipReason::SchedulerDisabled));
        }

        let local = window::to_business_time(now, self.offset);
        if let Err(veto) = window::evaluate(&policy.scheduler, local) {
            return Ok(self.skip(tenant_id, SkipReason::Window(veto)));
        }
        if policy.credit_balance <= 0 {
            return Ok(self.skip(
                tenant_id,
                SkipReason::NoCredits {
                    balance: policy.credit_balance,
                },
            ));
        }

        let today = local.date();
        let selection = self.selector.select(&tenant.id, today).await?;
        let total = selection.len();

        let mut report = CycleReport::new(tenant_id);
        report.low_credit = policy.is_low_credit();
        let mut handled = 0;

        for invoice in selection.iter() {
            if deadline_passed(deadline) {
                report.outcome = CycleOutcome::TimedOut;
                break;
            }

            match self.dispatcher.dispatch(tenant, invoice, today).await {
                Ok(outcome) => {
                    handled += 1;
                    report.sent += 1;
                    if let Some(change) = outcome.balance {
                        report.low_credit = change.low_credit_warning();
                    }
                    if let Some(err) = outcome.debit_error {
                        report.debit_warnings += 1;
                        if err.is_credit_exhaustion() {
                            report.outcome = CycleOutcome::BudgetExhausted;
                            break;
                        }
                    }
                }
                Err(err) => match err.class() {
                    ErrorClass::AdmissionDenied => {
                        // A provider-side refusal was a real attempt; a local
                        // credit denial leaves the invoice untouched.
                        if matches!(err, DunningError::ProviderCreditsExhausted { .. }) {
                            handled += 1;
                            report.failed += 1;
                        }
                        report.outcome = CycleOutcome::BudgetExhausted;
                        break;
                    }
                    ErrorClass::Configuration => {
                        if matches!(err, DunningError::MessagingDisabled { .. }) {
                            let reason = SkipReason::MessagingDisabled;
                            report.outcome = if handled == 0 {
                                CycleOutcome::Skipped(reason)
                            } else {
                                info!(
                                    tenant_id = %tenant.id,
                                    sent = report.sent,
                                    "messaging disabled mid-cycle; remaining invoices left"
                                );
                                CycleOutcome::Stopped(reason)
                            };
                            break;
                        }
                        handled += 1;
                        report.skipped += 1;
                        debug!(
                            tenant_id = %tenant.id,
                            invoice_id = %invoice.id,
                            error = %err,
                            "invoice skipped"
                        );
                    }
                    ErrorClass::Validation => {
                        handled += 1;
                        report.failed += 1;
                        warn!(
                            tenant_id = %tenant.id,
                            invoice_id = %invoice.id,
                            error = %err,
                            "invoice recipient rejected"
                        );
                    }
                    _ => {
                        handled += 1;
                        report.failed += 1;
                    }
                },
            }
        }

        report.untouched = total - handled;

        if report.outcome == CycleOutcome::BudgetExhausted {
            info!(
                tenant_id = %tenant.id,
                sent = report.sent,
                untouched = report.untouched,
                "credit budget exhausted; remaining invoices wait for the next run"
            );
        }
        info!(
            tenant_id = %tenant.id,
            selected = total,
            sent = report.sent,
            failed = report.failed,
            skipped = report.skipped,
            untouched = report.untouched,
            outcome = ?report.outcome,
            "tenant cycle finished"
        );

        Ok(report)
    }

    fn skip(&self, tenant_id: TenantId, reason: SkipReason) -> CycleReport {
        debug!(tenant_id = %tenant_id, %reason, "tenant cycle skipped");
        CycleReport::skipped(tenant_id, reason)
    }
}

fn deadline_passed(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use dunning_core::{
        Clock, MessageStatus, MessagingPolicy, ReminderFrequency, SchedulerPolicy,
    };
    use dunning_credit::CreditGate;
    use dunning_test_utils::{DebitFault, FaultySettings, TestHarness};

    fn cycle(harness: &TestHarness) -> TenantCycle {
        cycle_with(harness, harness.store.clone())
    }

    fn cycle_with(harness: &TestHarness, settings: Arc<dyn TenantSettingsStore>) -> TenantCycle {
        let dispatcher = Dispatcher::new(
            CreditGate::new(settings.clone()),
            harness.store.clone(),
            harness.transport.clone(),
            harness.clock.clone(),
            &harness.config,
        );
        TenantCycle::new(
            settings,
            OverdueInvoiceSelector::new(harness.store.clone()),
            dispatcher,
            harness.offset(),
        )
    }

    async fn seed_sales(harness: &TestHarness, tenant: &Tenant, count: i64) {
        for n in 0..count {
            harness
                .add_sales_invoice(
                    tenant,
                    &format!("S-{n}"),
                    harness.days_ago(10 - n),
                    Some("9876543210"),
                )
                .await
                .unwrap();
        }
    }

    async fn tenant_with(
        harness: &TestHarness,
        balance: i64,
        scheduler: SchedulerPolicy,
    ) -> Tenant {
        harness
            .add_tenant("t1", "Acme Traders", balance, scheduler)
            .await
            .unwrap()
    }

    async fn run(harness: &TestHarness, tenant: &Tenant) -> CycleReport {
        cycle(harness)
            .run(tenant, harness.clock.now(), None)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn scheduler_disabled_sends_nothing() {
        let harness = TestHarness::new().await.unwrap();
        let tenant = tenant_with(
            &harness,
            10,
            SchedulerPolicy {
                enabled: false,
                ..SchedulerPolicy::default()
            },
        )
        .await;
        harness
            .add_sales_invoice(&tenant, "S-1", harness.days_ago(5), Some("9876543210"))
            .await
            .unwrap();

        let report = run(&harness, &tenant).await;
        assert_eq!(
            report.outcome,
            CycleOutcome::Skipped(SkipReason::SchedulerDisabled)
        );
        assert_eq!(harness.transport.sent_count().await, 0);
    }

    #[tokio::test]
    async fn messaging_disabled_is_checked_first() {
        let harness = TestHarness::new().await.unwrap();
        let tenant = harness
            .add_tenant_with_policy(
                "t1",
                "Acme",
                true,
                MessagingPolicy {
                    enabled: false,
                    credit_balance: 10,
                    low_credit_threshold: 0,
                    scheduler: SchedulerPolicy {
                        enabled: false,
                        ..SchedulerPolicy::default()
                    },
                },
            )
            .await
            .unwrap();

        let report = run(&harness, &tenant).await;
        assert_eq!(
            report.outcome,
            CycleOutcome::Skipped(SkipReason::MessagingDisabled)
        );
    }

    #[tokio::test]
    async fn other_hours_send_nothing() {
        let harness = TestHarness::new().await.unwrap();
        let tenant = tenant_with(&harness, 10, SchedulerPolicy::default()).await;
        harness
            .add_sales_invoice(&tenant, "S-1", harness.days_ago(5), Some("9876543210"))
            .await
            .unwrap();

        for hour in (0..24).filter(|h| *h != 9) {
            harness.set_time(harness.today(), hour);
            let report = run(&harness, &tenant).await;
            assert!(
                matches!(
                    report.outcome,
                    CycleOutcome::Skipped(SkipReason::Window(WindowVeto::OutsideSendHour { .. }))
                ),
                "hour {hour}: {:?}",
                report.outcome
            );
        }
        assert_eq!(harness.transport.sent_count().await, 0);
    }

    #[tokio::test]
    async fn business_offset_shifts_the_send_hour() {
        let mut harness = TestHarness::new().await.unwrap();
        harness.config.scheduler.utc_offset_minutes = 330;
        let tenant = tenant_with(&harness, 10, SchedulerPolicy::default()).await;
        harness
            .add_sales_invoice(&tenant, "S-1", harness.days_ago(5), Some("9876543210"))
            .await
            .unwrap();

        // 03:30 UTC is 09:00 at +05:30.
        harness
            .clock
            .set(Utc.with_ymd_and_hms(2026, 3, 10, 3, 30, 0).unwrap());
        let report = run(&harness, &tenant).await;
        assert_eq!(report.outcome, CycleOutcome::Completed);
        assert_eq!(report.sent, 1);
    }

    #[tokio::test]
    async fn weekend_veto_for_daily_tenant() {
        let harness = TestHarness::new().await.unwrap();
        let tenant = tenant_with(
            &harness,
            10,
            SchedulerPolicy {
                send_on_weekends: false,
                ..SchedulerPolicy::default()
            },
        )
        .await;
        harness
            .clock
            .set(Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap());

        let report = run(&harness, &tenant).await;
        assert_eq!(
            report.outcome,
            CycleOutcome::Skipped(SkipReason::Window(WindowVeto::Weekend))
        );
    }

    #[tokio::test]
    async fn zero_balance_skips_before_selection() {
        let harness = TestHarness::new().await.unwrap();
        let tenant = tenant_with(&harness, 0, SchedulerPolicy::default()).await;
        harness
            .add_sales_invoice(&tenant, "S-1", harness.days_ago(5), Some("9876543210"))
            .await
            .unwrap();

        let report = run(&harness, &tenant).await;
        assert_eq!(
            report.outcome,
            CycleOutcome::Skipped(SkipReason::NoCredits { balance: 0 })
        );
        assert!(harness.attempts(&tenant).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stops_at_credit_exhaustion() {
        let harness = TestHarness::new().await.unwrap();
        let tenant = tenant_with(&harness, 2, SchedulerPolicy::default()).await;
        for (n, days) in [("S-1", 9), ("S-2", 8), ("S-3", 7)] {
            harness
                .add_sales_invoice(&tenant, n, harness.days_ago(days), Some("9876543210"))
                .await
                .unwrap();
        }
        harness
            .add_purchase_invoice(&tenant, "P-1", harness.days_ago(20), Some("9876543210"))
            .await
            .unwrap();

        let report = run(&harness, &tenant).await;
        assert_eq!(report.outcome, CycleOutcome::BudgetExhausted);
        assert_eq!(report.sent, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(report.untouched, 2);
        assert!(report.low_credit);
        assert_eq!(harness.balance(&tenant).await.unwrap(), 0);

        let attempts = harness.attempts(&tenant).await.unwrap();
        assert_eq!(attempts.len(), 2);
        let mut numbers: Vec<&str> = attempts.iter().map(|a| a.reference_number.as_str()).collect();
        numbers.sort();
        assert_eq!(numbers, ["S-1", "S-2"]);
    }

    #[tokio::test]
    async fn transport_failure_does_not_block_next_invoice() {
        let harness = TestHarness::new().await.unwrap();
        let tenant = tenant_with(&harness, 10, SchedulerPolicy::default()).await;
        harness
            .add_sales_invoice(&tenant, "S-A", harness.days_ago(9), Some("9876543210"))
            .await
            .unwrap();
        harness
            .add_sales_invoice(&tenant, "S-B", harness.days_ago(8), Some("9876543211"))
            .await
            .unwrap();
        harness.transport.push_failure("30008", "Unknown error").await;

        let report = run(&harness, &tenant).await;
        assert_eq!(report.outcome, CycleOutcome::Completed);
        assert_eq!((report.sent, report.failed, report.untouched), (1, 1, 0));

        let sends = harness.transport.sent_messages().await;
        assert_eq!(sends.len(), 2);
        assert_eq!(sends[1].to, "+919876543211");
        assert_eq!(harness.balance(&tenant).await.unwrap(), 9);
    }

    #[tokio::test]
    async fn invalid_phone_does_not_block_next_invoice() {
        let harness = TestHarness::new().await.unwrap();
        let tenant = tenant_with(&harness, 10, SchedulerPolicy::default()).await;
        harness
            .add_sales_invoice(&tenant, "S-A", harness.days_ago(9), Some("12"))
            .await
            .unwrap();
        harness
            .add_sales_invoice(&tenant, "S-B", harness.days_ago(8), Some("9876543211"))
            .await
            .unwrap();

        let report = run(&harness, &tenant).await;
        assert_eq!((report.sent, report.failed), (1, 1));
        // Validation failures never reach the log.
        assert_eq!(harness.attempts(&tenant).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn provider_exhaustion_stops_the_tenant() {
        let harness = TestHarness::new().await.unwrap();
        let tenant = tenant_with(&harness, 10, SchedulerPolicy::default()).await;
        for (n, days) in [("S-1", 9), ("S-2", 8), ("S-3", 7)] {
            harness
                .add_sales_invoice(&tenant, n, harness.days_ago(days), Some("9876543210"))
                .await
                .unwrap();
        }
        harness.transport.push_success().await;
        harness.transport.push_provider_exhausted("30044").await;

        let report = run(&harness, &tenant).await;
        assert_eq!(report.outcome, CycleOutcome::BudgetExhausted);
        assert_eq!((report.sent, report.failed, report.untouched), (1, 1, 1));
        assert_eq!(harness.transport.sent_count().await, 2);
        assert_eq!(harness.balance(&tenant).await.unwrap(), 9);
    }

    #[tokio::test]
    async fn missing_template_skips_only_that_kind() {
        let mut harness = TestHarness::new().await.unwrap();
        harness.config.templates.payment_notification = None;
        let tenant = tenant_with(&harness, 10, SchedulerPolicy::default()).await;
        harness
            .add_sales_invoice(&tenant, "S-1", harness.days_ago(3), Some("9876543210"))
            .await
            .unwrap();
        harness
            .add_purchase_invoice(&tenant, "P-1", harness.days_ago(3), Some("9876543210"))
            .await
            .unwrap();

        let report = run(&harness, &tenant).await;
        assert_eq!(report.outcome, CycleOutcome::Completed);
        assert_eq!((report.sent, report.failed, report.skipped), (1, 0, 1));
    }

    #[tokio::test]
    async fn sales_are_dispatched_before_purchases() {
        let harness = TestHarness::new().await.unwrap();
        let tenant = tenant_with(&harness, 10, SchedulerPolicy::default()).await;
        harness
            .add_purchase_invoice(&tenant, "P-old", harness.days_ago(30), Some("9000000001"))
            .await
            .unwrap();
        harness
            .add_sales_invoice(&tenant, "S-new", harness.days_ago(1), Some("9000000002"))
            .await
            .unwrap();
        harness
            .add_sales_invoice(&tenant, "S-old", harness.days_ago(10), Some("9000000003"))
            .await
            .unwrap();

        run(&harness, &tenant).await;
        let to: Vec<String> = harness
            .transport
            .sent_messages()
            .await
            .into_iter()
            .map(|m| m.to)
            .collect();
        assert_eq!(to, ["+919000000003", "+919000000002", "+919000000001"]);
    }

    #[tokio::test]
    async fn passed_deadline_dispatches_nothing() {
        let harness = TestHarness::new().await.unwrap();
        let tenant = tenant_with(&harness, 10, SchedulerPolicy::default()).await;
        harness
            .add_sales_invoice(&tenant, "S-1", harness.days_ago(3), Some("9876543210"))
            .await
            .unwrap();

        let report = cycle(&harness)
            .run(&tenant, harness.clock.now(), Some(Instant::now()))
            .await
            .unwrap();
        assert_eq!(
            report.outcome,
            CycleOutcome::Skipped(SkipReason::RunDeadline)
        );
        assert_eq!(harness.transport.sent_count().await, 0);
    }

    #[tokio::test]
    async fn every_logged_attempt_is_terminal() {
        let harness = TestHarness::new().await.unwrap();
        let tenant = tenant_with(&harness, 3, SchedulerPolicy::default()).await;
        for n in 0..5 {
            harness
                .add_sales_invoice(
                    &tenant,
                    &format!("S-{n}"),
                    harness.days_ago(10 - n),
                    Some("9876543210"),
                )
                .await
                .unwrap();
        }
        harness.transport.push_failure("30003", "Unreachable").await;

        run(&harness, &tenant).await;
        let attempts = harness.attempts(&tenant).await.unwrap();
        assert!(!attempts.is_empty());
        assert!(attempts.iter().all(|a| a.status.is_terminal_for_dispatch()));
        assert_eq!(
            attempts.iter().filter(|a| a.status == MessageStatus::Sent).count(),
            3
        );
    }

    #[tokio::test]
    async fn weekly_tenant_runs_only_on_monday() {
        let harness = TestHarness::new().await.unwrap();
        let tenant = tenant_with(
            &harness,
            100,
            SchedulerPolicy {
                reminder_frequency: ReminderFrequency::Weekly,
                ..SchedulerPolicy::default()
            },
        )
        .await;
        harness
            .add_sales_invoice(&tenant, "S-1", harness.days_ago(30), Some("9876543210"))
            .await
            .unwrap();

        let monday = Utc.with_ymd_and_hms(2026, 3, 9, 9, 0, 0).unwrap();
        let mut sent_days = Vec::new();
        for offset in 0..7 {
            let at = monday + Duration::days(offset);
            harness.clock.set(at);
            let report = run(&harness, &tenant).await;
            if report.sent > 0 {
                sent_days.push(offset);
            }
        }
        assert_eq!(sent_days, [0]);
    }

    #[tokio::test]
    async fn drained_balance_after_send_stops_the_tenant() {
        let harness = TestHarness::new().await.unwrap();
        let tenant = tenant_with(&harness, 10, SchedulerPolicy::default()).await;
        seed_sales(&harness, &tenant, 3).await;
        let settings = Arc::new(FaultySettings::new(harness.store.clone()));
        settings.fail_debits(DebitFault::InsufficientCredits).await;

        let report = cycle_with(&harness, settings)
            .run(&tenant, harness.clock.now(), None)
            .await
            .unwrap();
        assert_eq!(report.outcome, CycleOutcome::BudgetExhausted);
        assert_eq!((report.sent, report.debit_warnings, report.untouched), (1, 1, 2));

        let attempts = harness.attempts(&tenant).await.unwrap();
        assert_eq!(attempts.len(), 1);
        assert_eq!(attempts[0].status, MessageStatus::Sent);
        assert_eq!(harness.balance(&tenant).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn ledger_write_failure_after_send_keeps_going() {
        let harness = TestHarness::new().await.unwrap();
        let tenant = tenant_with(&harness, 10, SchedulerPolicy::default()).await;
        seed_sales(&harness, &tenant, 2).await;
        let settings = Arc::new(FaultySettings::new(harness.store.clone()));
        settings.fail_debits(DebitFault::Storage).await;

        let report = cycle_with(&harness, settings)
            .run(&tenant, harness.clock.now(), None)
            .await
            .unwrap();
        assert_eq!(report.outcome, CycleOutcome::Completed);
        assert_eq!((report.sent, report.debit_warnings, report.untouched), (2, 2, 0));
        assert_eq!(harness.transport.sent_count().await, 2);
        assert_eq!(harness.balance(&tenant).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn messaging_disabled_mid_cycle_is_a_stop() {
        let harness = TestHarness::new().await.unwrap();
        let tenant = tenant_with(&harness, 10, SchedulerPolicy::default()).await;
        seed_sales(&harness, &tenant, 2).await;
        let settings = Arc::new(FaultySettings::new(harness.store.clone()));
        // One read for the cycle switches, one for the first admission check.
        settings.disable_messaging_after(2).await;

        let report = cycle_with(&harness, settings)
            .run(&tenant, harness.clock.now(), None)
            .await
            .unwrap();
        assert_eq!(
            report.outcome,
            CycleOutcome::Stopped(SkipReason::MessagingDisabled)
        );
        assert_eq!((report.sent, report.untouched), (1, 1));
        assert_eq!(harness.transport.sent_count().await, 1);
    }

    #[tokio::test]
    async fn messaging_disabled_before_first_send_is_a_skip() {
        let harness = TestHarness::new().await.unwrap();
        let tenant = tenant_with(&harness, 10, SchedulerPolicy::default()).await;
        seed_sales(&harness, &tenant, 2).await;
        let settings = Arc::new(FaultySettings::new(harness.store.clone()));
        settings.disable_messaging_after(1).await;

        let report = cycle_with(&harness, settings)
            .run(&tenant, harness.clock.now(), None)
            .await
            .unwrap();
        assert_eq!(
            report.outcome,
            CycleOutcome::Skipped(SkipReason::MessagingDisabled)
        );
        assert_eq!((report.sent, report.untouched), (0, 2));
        assert_eq!(harness.transport.sent_count().await, 0);
    }
}
