// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message attempt persistence.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dunning_core::{
    DunningError, MessageAttempt, MessageStatus, MessageType, NewMessageAttempt, RecipientType,
    TenantId,
};
use rust_decimal::Decimal;
use rusqlite::{OptionalExtension, params};

use crate::database::{
    Database, format_timestamp, get_parsed, get_parsed_opt, map_call_err, map_tr_err,
};

const ATTEMPT_COLUMNS: &str = "id, tenant_id, recipient_type, recipient_id, recipient_phone,
     message_type, reference_type, reference_id, reference_number, template_id, status,
     template_variables, provider_message_id, sent_at, error_code, error_message, cost,
     cost_currency, created_at";

/// Inserts a `pending` attempt and returns its generated id.
pub async fn insert_attempt(
    db: &Database,
    attempt: &NewMessageAttempt,
) -> Result<String, DunningError> {
    let id = uuid::Uuid::new_v4().to_string();
    let variables = serde_json::to_string(&attempt.template_variables)
        .map_err(DunningError::storage)?;
    let attempt = attempt.clone();
    let row_id = id.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO message_log (id, tenant_id, recipient_type, recipient_id,
                     recipient_phone, message_type, reference_type, reference_id,
                     reference_number, template_id, status, template_variables)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 'pending', ?11)",
                params![
                    row_id,
                    attempt.tenant_id.0,
                    attempt.recipient_type.to_string(),
                    attempt.recipient_id,
                    attempt.recipient_phone,
                    attempt.message_type.to_string(),
                    attempt.reference_type,
                    attempt.reference_id,
                    attempt.reference_number,
                    attempt.template_id,
                    variables,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
    Ok(id)
}

/// `pending` -> `sent`.
pub async fn mark_sent(
    db: &Database,
    attempt_id: &str,
    provider_message_id: &str,
    sent_at: DateTime<Utc>,
) -> Result<(), DunningError> {
    let attempt_id = attempt_id.to_string();
    let provider_message_id = provider_message_id.to_string();
    let sent_at = format_timestamp(sent_at);
    transition(db, attempt_id, move |conn, id| {
        conn.execute(
            "UPDATE message_log
             SET status = 'sent', provider_message_id = ?2, sent_at = ?3
             WHERE id = ?1 AND status = 'pending'",
            params![id, provider_message_id, sent_at],
        )
    })
    .await
}

/// `pending` -> `failed`.
pub async fn mark_failed(
    db: &Database,
    attempt_id: &str,
    error_code: Option<&str>,
    error_message: &str,
) -> Result<(), DunningError> {
    let attempt_id = attempt_id.to_string();
    let error_code = error_code.map(str::to_string);
    let error_message = error_message.to_string();
    transition(db, attempt_id, move |conn, id| {
        conn.execute(
            "UPDATE message_log
             SET status = 'failed', error_code = ?2, error_message = ?3
             WHERE id = ?1 AND status = 'pending'",
            params![id, error_code, error_message],
        )
    })
    .await
}

/// Runs a guarded status update and rejects it if the attempt was not pending.
async fn transition<F>(db: &Database, attempt_id: String, update: F) -> Result<(), DunningError>
where
    F: FnOnce(&rusqlite::Connection, &str) -> rusqlite::Result<usize> + Send + 'static,
{
    db.connection()
        .call(move |conn| -> Result<(), DunningError> {
            let changed = update(conn, &attempt_id).map_err(DunningError::storage)?;
            if changed == 1 {
                return Ok(());
            }
            let status: Option<String> = conn
                .query_row(
                    "SELECT status FROM message_log WHERE id = ?1",
                    params![attempt_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(DunningError::storage)?;
            Err(match status {
                Some(status) => DunningError::Internal(format!(
                    "message attempt {attempt_id} is already {status}"
                )),
                None => DunningError::Internal(format!("message attempt {attempt_id} not found")),
            })
        })
        .await
        .map_err(map_call_err)
}

pub async fn get_attempt(
    db: &Database,
    attempt_id: &str,
) -> Result<Option<MessageAttempt>, DunningError> {
    let attempt_id = attempt_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {ATTEMPT_COLUMNS} FROM message_log WHERE id = ?1"),
                params![attempt_id],
                attempt_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Newest first.
pub async fn list_attempts(
    db: &Database,
    tenant_id: &TenantId,
    status: Option<MessageStatus>,
    limit: usize,
) -> Result<Vec<MessageAttempt>, DunningError> {
    let tenant_id = tenant_id.0.clone();
    let status = status.map(|s| s.to_string());
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ATTEMPT_COLUMNS} FROM message_log
                 WHERE tenant_id = ?1 AND (?2 IS NULL OR status = ?2)
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?3"
            ))?;
            let attempts = stmt
                .query_map(params![tenant_id, status, limit], attempt_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(attempts)
        })
        .await
        .map_err(map_tr_err)
}

pub async fn count_by_status(
    db: &Database,
    tenant_id: &TenantId,
) -> Result<Vec<(MessageStatus, u64)>, DunningError> {
    let tenant_id = tenant_id.0.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT status, COUNT(*) FROM message_log
                 WHERE tenant_id = ?1
                 GROUP BY status
                 ORDER BY status",
            )?;
            let counts = stmt
                .query_map(params![tenant_id], |row| {
                    Ok((get_parsed::<MessageStatus>(row, 0)?, row.get::<_, u64>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(counts)
        })
        .await
        .map_err(map_tr_err)
}

fn attempt_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageAttempt> {
    let variables: String = row.get(11)?;
    let template_variables: BTreeMap<String, String> = serde_json::from_str(&variables)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(11, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(MessageAttempt {
        id: row.get(0)?,
        tenant_id: TenantId(row.get(1)?),
        recipient_type: get_parsed::<RecipientType>(row, 2)?,
        recipient_id: row.get(3)?,
        recipient_phone: row.get(4)?,
        message_type: get_parsed::<MessageType>(row, 5)?,
        reference_type: row.get(6)?,
        reference_id: row.get(7)?,
        reference_number: row.get(8)?,
        template_id: row.get(9)?,
        status: get_parsed::<MessageStatus>(row, 10)?,
        template_variables,
        provider_message_id: row.get(12)?,
        sent_at: get_parsed_opt::<DateTime<Utc>>(row, 13)?,
        error_code: row.get(14)?,
        error_message: row.get(15)?,
        cost: get_parsed_opt::<Decimal>(row, 16)?,
        cost_currency: row.get(17)?,
        created_at: get_parsed::<DateTime<Utc>>(row, 18)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::tenants::upsert_tenant;
    use dunning_core::Tenant;

    async fn db() -> Database {
        let db = Database::open_in_memory().await.unwrap();
        upsert_tenant(
            &db,
            &Tenant {
                id: TenantId::from("t1"),
                name: "Acme".into(),
            },
            true,
        )
        .await
        .unwrap();
        db
    }

    fn new_attempt(reference: &str) -> NewMessageAttempt {
        NewMessageAttempt {
            tenant_id: TenantId::from("t1"),
            recipient_type: RecipientType::Retailer,
            recipient_id: "r1".into(),
            recipient_phone: "+919876543210".into(),
            message_type: MessageType::PaymentReminder,
            reference_type: "sales_invoice".into(),
            reference_id: reference.into(),
            reference_number: format!("INV-{reference}"),
            template_id: "HX1".into(),
            template_variables: BTreeMap::from([
                ("1".to_string(), "Corner Shop".to_string()),
                ("3".to_string(), "10.00".to_string()),
            ]),
        }
    }

    #[tokio::test]
    async fn insert_starts_pending_with_all_fields() {
        let db = db().await;
        let id = insert_attempt(&db, &new_attempt("s1")).await.unwrap();

        let attempt = get_attempt(&db, &id).await.unwrap().unwrap();
        assert_eq!(attempt.status, MessageStatus::Pending);
        assert_eq!(attempt.reference_number, "INV-s1");
        assert_eq!(attempt.template_variables["1"], "Corner Shop");
        assert!(attempt.sent_at.is_none());
        assert!(attempt.provider_message_id.is_none());
    }

    #[tokio::test]
    async fn sent_transition_records_provider_id() {
        let db = db().await;
        let id = insert_attempt(&db, &new_attempt("s1")).await.unwrap();
        let at = Utc::now();
        mark_sent(&db, &id, "SM123", at).await.unwrap();

        let attempt = get_attempt(&db, &id).await.unwrap().unwrap();
        assert_eq!(attempt.status, MessageStatus::Sent);
        assert_eq!(attempt.provider_message_id.as_deref(), Some("SM123"));
        assert_eq!(
            attempt.sent_at.map(|t| t.timestamp_millis()),
            Some(at.timestamp_millis())
        );
    }

    #[tokio::test]
    async fn terminal_states_cannot_transition_again() {
        let db = db().await;
        let id = insert_attempt(&db, &new_attempt("s1")).await.unwrap();
        mark_failed(&db, &id, Some("63016"), "outside window")
            .await
            .unwrap();

        let err = mark_sent(&db, &id, "SM1", Utc::now()).await.unwrap_err();
        assert!(err.to_string().contains("already failed"), "{err}");

        let attempt = get_attempt(&db, &id).await.unwrap().unwrap();
        assert_eq!(attempt.status, MessageStatus::Failed);
        assert_eq!(attempt.error_code.as_deref(), Some("63016"));
        assert_eq!(attempt.error_message.as_deref(), Some("outside window"));
    }

    #[tokio::test]
    async fn unknown_attempt_cannot_transition() {
        let db = db().await;
        let err = mark_failed(&db, "nope", None, "x").await.unwrap_err();
        assert!(err.to_string().contains("not found"), "{err}");
    }

    #[tokio::test]
    async fn list_filters_by_status_and_counts() {
        let db = db().await;
        let a = insert_attempt(&db, &new_attempt("s1")).await.unwrap();
        let b = insert_attempt(&db, &new_attempt("s2")).await.unwrap();
        insert_attempt(&db, &new_attempt("s3")).await.unwrap();
        mark_sent(&db, &a, "SM1", Utc::now()).await.unwrap();
        mark_failed(&db, &b, None, "boom").await.unwrap();

        let t = TenantId::from("t1");
        let all = list_attempts(&db, &t, None, 10).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].reference_id, "s3");

        let sent = list_attempts(&db, &t, Some(MessageStatus::Sent), 10)
            .await
            .unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].id, a);

        let counts = count_by_status(&db, &t).await.unwrap();
        assert_eq!(
            counts,
            vec![
                (MessageStatus::Failed, 1),
                (MessageStatus::Pending, 1),
                (MessageStatus::Sent, 1),
            ]
        );
    }
}
