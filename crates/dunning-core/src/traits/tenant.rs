// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant messaging policy and the prepaid credit ledger.

use async_trait::async_trait;

use crate::error::DunningError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{BalanceChange, CreditTransaction, MessagingPolicy, Tenant, TenantId};

#[async_trait]
pub trait TenantSettingsStore: PluginAdapter {
    /// All tenants flagged active, in a stable order.
    async fn list_active_tenants(&self) -> Result<Vec<Tenant>, DunningError>;

    /// Reads the tenant's messaging policy and current balance.
    ///
    /// Returns [`DunningError::TenantNotFound`] if the tenant has no settings.
    async fn messaging_policy(&self, tenant_id: &TenantId)
    -> Result<MessagingPolicy, DunningError>;

    /// Atomically subtracts `amount` credits and appends a ledger entry.
    ///
    /// The balance is never driven negative: if it cannot cover `amount` at
    /// the moment of the write, nothing changes and
    /// [`DunningError::InsufficientCredits`] is returned.
    async fn debit_credits(
        &self,
        tenant_id: &TenantId,
        amount: i64,
        reference_type: &str,
        reference_id: &str,
    ) -> Result<BalanceChange, DunningError>;

    /// Adds purchased credits and appends a positive ledger entry.
    async fn top_up_credits(
        &self,
        tenant_id: &TenantId,
        amount: i64,
        reference_id: &str,
    ) -> Result<BalanceChange, DunningError>;

    /// Most recent ledger entries first.
    async fn credit_history(
        &self,
        tenant_id: &TenantId,
        limit: usize,
    ) -> Result<Vec<CreditTransaction>, DunningError>;
}
