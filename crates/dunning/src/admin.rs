// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operator commands: `dunning messages`, `dunning credits`, `dunning top-up`.

use dunning_core::{
    BalanceChange, CreditTransaction, DunningError, MessageAttempt, MessageLogStore,
    MessageStatus, TenantId, TenantSettingsStore,
};
use dunning_credit::CreditGate;
use serde::Serialize;

/// Ledger entries shown by `dunning credits`.
pub const STATEMENT_ENTRIES: usize = 20;

/// Output of `dunning credits`.
#[derive(Debug, Serialize)]
pub struct CreditStatement {
    pub tenant_id: TenantId,
    pub credit_balance: i64,
    pub low_credit_threshold: i64,
    pub low_credit: bool,
    pub status_counts: Vec<StatusCount>,
    pub recent: Vec<CreditTransaction>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct StatusCount {
    pub status: MessageStatus,
    pub count: u64,
}

/// Output of `dunning top-up`.
#[derive(Debug, Serialize)]
pub struct TopUpReceipt {
    pub tenant_id: TenantId,
    pub amount: i64,
    pub reference_id: String,
    pub new_balance: i64,
}

pub async fn list_messages(
    log: &dyn MessageLogStore,
    tenant_id: &TenantId,
    status: Option<MessageStatus>,
    limit: usize,
) -> Result<Vec<MessageAttempt>, DunningError> {
    log.list_attempts(tenant_id, status, limit).await
}

pub async fn credit_statement(
    settings: &dyn TenantSettingsStore,
    log: &dyn MessageLogStore,
    tenant_id: &TenantId,
) -> Result<CreditStatement, DunningError> {
    let policy = settings.messaging_policy(tenant_id).await?;
    let recent = settings.credit_history(tenant_id, STATEMENT_ENTRIES).await?;
    let status_counts = log
        .count_by_status(tenant_id)
        .await?
        .into_iter()
        .map(|(status, count)| StatusCount { status, count })
        .collect();

    Ok(CreditStatement {
        tenant_id: tenant_id.clone(),
        credit_balance: policy.credit_balance,
        low_credit_threshold: policy.low_credit_threshold,
        low_credit: policy.is_low_credit(),
        status_counts,
        recent,
    })
}

/// Credits a purchase. Without an explicit reference a `cli-<uuid>` one is
/// generated.
pub async fn top_up(
    gate: &CreditGate,
    tenant_id: &TenantId,
    amount: i64,
    reference: Option<String>,
) -> Result<TopUpReceipt, DunningError> {
    let reference_id = reference.unwrap_or_else(|| format!("cli-{}", uuid::Uuid::new_v4()));
    let BalanceChange { new_balance, .. } = gate.top_up(tenant_id, amount, &reference_id).await?;

    Ok(TopUpReceipt {
        tenant_id: tenant_id.clone(),
        amount,
        reference_id,
        new_balance,
    })
}
