// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Overdue invoice selection.

use std::sync::Arc;

use chrono::NaiveDate;
use dunning_core::{DunningError, Invoice, InvoiceStore, TenantId};
use tracing::debug;

/// Both overdue queues for one tenant, each oldest-first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverdueSelection {
    pub sales: Vec<Invoice>,
    pub purchases: Vec<Invoice>,
}

impl OverdueSelection {
    pub fn len(&self) -> usize {
        self.sales.len() + self.purchases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sales.is_empty() && self.purchases.is_empty()
    }

    /// Dispatch order: every sales invoice, then every purchase invoice.
    pub fn iter(&self) -> impl Iterator<Item = &Invoice> {
        self.sales.iter().chain(self.purchases.iter())
    }
}

/// Reads the overdue set from an [`InvoiceStore`] without capping it.
#[derive(Clone)]
pub struct OverdueInvoiceSelector {
    store: Arc<dyn InvoiceStore>,
}

impl OverdueInvoiceSelector {
    pub fn new(store: Arc<dyn InvoiceStore>) -> Self {
        Self { store }
    }

    /// Invoices dated strictly before `today` that still have money outstanding.
    pub async fn select(
        &self,
        tenant_id: &TenantId,
        today: NaiveDate,
    ) -> Result<OverdueSelection, DunningError> {
        let sales = self.store.overdue_sales_invoices(tenant_id, today).await?;
        let purchases = self.store.overdue_purchase_invoices(tenant_id, today).await?;

        debug!(
            tenant_id = %tenant_id,
            sales = sales.len(),
            purchases = purchases.len(),
            "overdue invoices selected"
        );

        Ok(OverdueSelection { sales, purchases })
    }
}
