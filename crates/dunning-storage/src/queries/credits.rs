// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credit balance mutations and the append-only ledger.
//!
//! Every balance change is a single conditional `UPDATE ... RETURNING` plus a
//! ledger insert inside one immediate transaction, so concurrent debits can
//! never observe the same balance and the balance can never go negative.

use dunning_core::types::TOP_UP_REFERENCE;
use dunning_core::{BalanceChange, CreditTransaction, DunningError, TenantId};
use rusqlite::{OptionalExtension, TransactionBehavior, params};

use crate::database::{Database, get_parsed, map_tr_err};

/// Result of a conditional debit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    Applied(BalanceChange),
    /// Balance at the moment of the attempted write; nothing was changed.
    Insufficient { balance: i64 },
    /// The tenant has no messaging settings row.
    NoSettings,
}

pub async fn debit(
    db: &Database,
    tenant_id: &TenantId,
    amount: i64,
    reference_type: &str,
    reference_id: &str,
) -> Result<DebitOutcome, DunningError> {
    if amount <= 0 {
        return Err(DunningError::Internal(format!(
            "debit amount must be positive, got {amount}"
        )));
    }

    let tenant_id = tenant_id.0.clone();
    let reference_type = reference_type.to_string();
    let reference_id = reference_id.to_string();
    let entry_id = uuid::Uuid::new_v4().to_string();

    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let applied: Option<(i64, i64)> = tx
                .query_row(
                    "UPDATE tenant_messaging
                     SET credit_balance = credit_balance - ?2,
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE tenant_id = ?1 AND credit_balance >= ?2
                     RETURNING credit_balance, low_credit_threshold",
                    params![tenant_id, amount],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let Some((new_balance, low_credit_threshold)) = applied else {
                let balance: Option<i64> = tx
                    .query_row(
                        "SELECT credit_balance FROM tenant_messaging WHERE tenant_id = ?1",
                        params![tenant_id],
                        |row| row.get(0),
                    )
                    .optional()?;
                tx.commit()?;
                return Ok(match balance {
                    Some(balance) => DebitOutcome::Insufficient { balance },
                    None => DebitOutcome::NoSettings,
                });
            };

            tx.execute(
                "INSERT INTO credit_transactions
                     (id, tenant_id, amount, balance_after, reference_type, reference_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    entry_id,
                    tenant_id,
                    -amount,
                    new_balance,
                    reference_type,
                    reference_id
                ],
            )?;
            tx.commit()?;

            Ok(DebitOutcome::Applied(BalanceChange {
                new_balance,
                low_credit_threshold,
            }))
        })
        .await
        .map_err(map_tr_err)
}

/// Adds purchased credits. Returns `None` if the tenant has no settings row.
pub async fn top_up(
    db: &Database,
    tenant_id: &TenantId,
    amount: i64,
    reference_id: &str,
) -> Result<Option<BalanceChange>, DunningError> {
    if amount <= 0 {
        return Err(DunningError::Internal(format!(
            "top-up amount must be positive, got {amount}"
        )));
    }

    let tenant_id = tenant_id.0.clone();
    let reference_id = reference_id.to_string();
    let entry_id = uuid::Uuid::new_v4().to_string();

    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let applied: Option<(i64, i64)> = tx
                .query_row(
                    "UPDATE tenant_messaging
                     SET credit_balance = credit_balance + ?2,
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                     WHERE tenant_id = ?1
                     RETURNING credit_balance, low_credit_threshold",
                    params![tenant_id, amount],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let Some((new_balance, low_credit_threshold)) = applied else {
                return Ok(None);
            };

            tx.execute(
                "INSERT INTO credit_transactions
                     (id, tenant_id, amount, balance_after, reference_type, reference_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    entry_id,
                    tenant_id,
                    amount,
                    new_balance,
                    TOP_UP_REFERENCE,
                    reference_id
                ],
            )?;
            tx.commit()?;

            Ok(Some(BalanceChange {
                new_balance,
                low_credit_threshold,
            }))
        })
        .await
        .map_err(map_tr_err)
}

/// Newest entries first.
pub async fn history(
    db: &Database,
    tenant_id: &TenantId,
    limit: usize,
) -> Result<Vec<CreditTransaction>, DunningError> {
    let tenant_id = tenant_id.0.clone();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, tenant_id, amount, balance_after, reference_type, reference_id,
                        created_at
                 FROM credit_transactions
                 WHERE tenant_id = ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?2",
            )?;
            let entries = stmt
                .query_map(params![tenant_id, limit], |row| {
                    Ok(CreditTransaction {
                        id: row.get(0)?,
                        tenant_id: TenantId(row.get(1)?),
                        amount: row.get(2)?,
                        balance_after: row.get(3)?,
                        reference_type: row.get(4)?,
                        reference_id: row.get(5)?,
                        created_at: get_parsed(row, 6)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(entries)
        })
        .await
        .map_err(map_tr_err)
}
