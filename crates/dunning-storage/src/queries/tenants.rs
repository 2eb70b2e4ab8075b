// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant rows and messaging policy.

use dunning_core::{
    DunningError, MessagingPolicy, ReminderFrequency, SchedulerPolicy, Tenant, TenantId,
};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, get_parsed, map_tr_err};

/// Inserts or renames a tenant.
pub async fn upsert_tenant(
    db: &Database,
    tenant: &Tenant,
    active: bool,
) -> Result<(), DunningError> {
    let id = tenant.id.0.clone();
    let name = tenant.name.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO tenants (id, name, active) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET name = excluded.name, active = excluded.active",
                params![id, name, active],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Writes the full messaging policy, including the credit balance.
///
/// Balance changes made here bypass the ledger; use the credit queries for
/// anything other than initial provisioning.
pub async fn set_messaging_policy(
    db: &Database,
    tenant_id: &TenantId,
    policy: &MessagingPolicy,
) -> Result<(), DunningError> {
    let tenant_id = tenant_id.0.clone();
    let policy = policy.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO tenant_messaging (tenant_id, enabled, credit_balance,
                     low_credit_threshold, scheduler_enabled, preferred_send_hour,
                     reminder_frequency, send_on_weekends)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT(tenant_id) DO UPDATE SET
                     enabled = excluded.enabled,
                     credit_balance = excluded.credit_balance,
                     low_credit_threshold = excluded.low_credit_threshold,
                     scheduler_enabled = excluded.scheduler_enabled,
                     preferred_send_hour = excluded.preferred_send_hour,
                     reminder_frequency = excluded.reminder_frequency,
                     send_on_weekends = excluded.send_on_weekends,
                     updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![
                    tenant_id,
                    policy.enabled,
                    policy.credit_balance,
                    policy.low_credit_threshold,
                    policy.scheduler.enabled,
                    policy.scheduler.preferred_send_hour,
                    policy.scheduler.reminder_frequency.to_string(),
                    policy.scheduler.send_on_weekends,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn list_active_tenants(db: &Database) -> Result<Vec<Tenant>, DunningError> {
    db.connection()
        .call(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, name FROM tenants WHERE active = 1 ORDER BY id")?;
            let tenants = stmt
                .query_map([], |row| {
                    Ok(Tenant {
                        id: TenantId(row.get(0)?),
                        name: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tenants)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_tenant(db: &Database, tenant_id: &TenantId) -> Result<Option<Tenant>, DunningError> {
    let id = tenant_id.0.clone();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT id, name FROM tenants WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Tenant {
                        id: TenantId(row.get(0)?),
                        name: row.get(1)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_messaging_policy(
    db: &Database,
    tenant_id: &TenantId,
) -> Result<Option<MessagingPolicy>, DunningError> {
    let tenant_id = tenant_id.0.clone();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT enabled, credit_balance, low_credit_threshold, scheduler_enabled,
                        preferred_send_hour, reminder_frequency, send_on_weekends
                 FROM tenant_messaging WHERE tenant_id = ?1",
                params![tenant_id],
                |row| {
                    Ok(MessagingPolicy {
                        enabled: row.get(0)?,
                        credit_balance: row.get(1)?,
                        low_credit_threshold: row.get(2)?,
                        scheduler: SchedulerPolicy {
                            enabled: row.get(3)?,
                            preferred_send_hour: row.get(4)?,
                            reminder_frequency: get_parsed::<ReminderFrequency>(row, 5)?,
                            send_on_weekends: row.get(6)?,
                        },
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(id: &str) -> Tenant {
        Tenant {
            id: TenantId::from(id),
            name: format!("{id} Traders"),
        }
    }

    #[tokio::test]
    async fn policy_round_trips() {
        let db = Database::open_in_memory().await.unwrap();
        upsert_tenant(&db, &tenant("t1"), true).await.unwrap();

        let policy = MessagingPolicy {
            enabled: true,
            credit_balance: 42,
            low_credit_threshold: 5,
            scheduler: SchedulerPolicy {
                enabled: false,
                preferred_send_hour: 17,
                reminder_frequency: ReminderFrequency::Monthly,
                send_on_weekends: false,
            },
        };
        set_messaging_policy(&db, &TenantId::from("t1"), &policy)
            .await
            .unwrap();

        let loaded = get_messaging_policy(&db, &TenantId::from("t1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded, policy);
    }

    #[tokio::test]
    async fn missing_policy_is_none() {
        let db = Database::open_in_memory().await.unwrap();
        upsert_tenant(&db, &tenant("t1"), true).await.unwrap();
        assert!(
            get_messaging_policy(&db, &TenantId::from("t1"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn only_active_tenants_are_listed() {
        let db = Database::open_in_memory().await.unwrap();
        upsert_tenant(&db, &tenant("b"), true).await.unwrap();
        upsert_tenant(&db, &tenant("a"), true).await.unwrap();
        upsert_tenant(&db, &tenant("c"), false).await.unwrap();

        let ids: Vec<String> = list_active_tenants(&db)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id.0)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn negative_balance_is_rejected_by_schema() {
        let db = Database::open_in_memory().await.unwrap();
        upsert_tenant(&db, &tenant("t1"), true).await.unwrap();
        let policy = MessagingPolicy {
            enabled: true,
            credit_balance: -1,
            low_credit_threshold: 0,
            scheduler: SchedulerPolicy::default(),
        };
        assert!(
            set_messaging_policy(&db, &TenantId::from("t1"), &policy)
                .await
                .is_err()
        );
    }
}
