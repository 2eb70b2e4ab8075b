// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only invoice queries.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::DunningError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Invoice, TenantId};

/// Overdue-invoice queries over a tenant's sales and purchase ledgers.
///
/// Both queries filter on status (`unpaid` or `partially_paid`), a positive
/// outstanding amount, and an invoice date strictly before `before`. Results
/// are ordered oldest invoice date first and are never truncated.
#[async_trait]
pub trait InvoiceStore: PluginAdapter {
    /// Overdue invoices the tenant has issued to its retailers.
    async fn overdue_sales_invoices(
        &self,
        tenant_id: &TenantId,
        before: NaiveDate,
    ) -> Result<Vec<Invoice>, DunningError>;

    /// Overdue invoices the tenant owes to its vendors.
    async fn overdue_purchase_invoices(
        &self,
        tenant_id: &TenantId,
        before: NaiveDate,
    ) -> Result<Vec<Invoice>, DunningError>;
}
