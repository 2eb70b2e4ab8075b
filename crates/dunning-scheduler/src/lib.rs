// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled payment-reminder runs.
//!
//! [`Scheduler`] fires on a cron schedule and runs a [`TenantCycle`] for every
//! active tenant. Each cycle gates on the tenant's send window and credit
//! balance, selects overdue invoices, and hands them one at a time to the
//! [`Dispatcher`].

pub mod cycle;
pub mod dispatch;
pub mod driver;
pub mod selector;
pub mod summary;
pub mod template;
pub mod window;

pub use cycle::{CycleOutcome, CycleReport, SkipReason, TenantCycle};
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use driver::{Scheduler, SchedulerDeps};
pub use selector::{OverdueInvoiceSelector, OverdueSelection};
pub use summary::RunSummary;
pub use window::WindowVeto;
