// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the invoice, tenant-settings and message-log stores.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use dunning_config::model::StorageConfig;
use dunning_core::{
    AdapterType, BalanceChange, CreditTransaction, DunningError, HealthStatus, Invoice,
    InvoiceStore, MessageAttempt, MessageLogStore, MessageStatus, MessagingPolicy,
    NewMessageAttempt, PluginAdapter, Tenant, TenantId, TenantSettingsStore,
};

use crate::database::{Database, map_tr_err};
use crate::queries;
use crate::queries::credits::DebitOutcome;

/// One SQLite database backing all three stores.
#[derive(Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Opens the configured database file and applies migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, DunningError> {
        let db = Database::open(&config.database_path, config.wal_mode).await?;
        debug!(path = %config.database_path, "SQLite store initialized");
        Ok(Self::new(db))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl PluginAdapter for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, DunningError> {
        self.db
            .connection()
            .call(|conn| -> Result<i64, rusqlite::Error> {
                conn.query_row("SELECT 1", [], |row| row.get(0))
            })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DunningError> {
        self.db
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))
            })
            .await
            .map_err(map_tr_err)?;
        debug!("shutdown: WAL checkpoint complete");
        Ok(())
    }
}

#[async_trait]
impl InvoiceStore for SqliteStore {
    async fn overdue_sales_invoices(
        &self,
        tenant_id: &TenantId,
        before: NaiveDate,
    ) -> Result<Vec<Invoice>, DunningError> {
        queries::invoices::overdue_sales(&self.db, tenant_id, before).await
    }

    async fn overdue_purchase_invoices(
        &self,
        tenant_id: &TenantId,
        before: NaiveDate,
    ) -> Result<Vec<Invoice>, DunningError> {
        queries::invoices::overdue_purchases(&self.db, tenant_id, before).await
    }
}

#[async_trait]
impl TenantSettingsStore for SqliteStore {
    async fn list_active_tenants(&self) -> Result<Vec<Tenant>, DunningError> {
        queries::tenants::list_active_tenants(&self.db).await
    }

    async fn messaging_policy(
        &self,
        tenant_id: &TenantId,
    ) -> Result<MessagingPolicy, DunningError> {
        queries::tenants::get_messaging_policy(&self.db, tenant_id)
            .await?
            .ok_or_else(|| DunningError::TenantNotFound(tenant_id.to_string()))
    }

    async fn debit_credits(
        &self,
        tenant_id: &TenantId,
        amount: i64,
        reference_type: &str,
        reference_id: &str,
    ) -> Result<BalanceChange, DunningError> {
        match queries::credits::debit(&self.db, tenant_id, amount, reference_type, reference_id)
            .await?
        {
            DebitOutcome::Applied(change) => Ok(change),
            DebitOutcome::Insufficient { balance } => Err(DunningError::InsufficientCredits {
                tenant_id: tenant_id.to_string(),
                balance,
                required: amount,
            }),
            DebitOutcome::NoSettings => Err(DunningError::TenantNotFound(tenant_id.to_string())),
        }
    }

    async fn top_up_credits(
        &self,
        tenant_id: &TenantId,
        amount: i64,
        reference_id: &str,
    ) -> Result<BalanceChange, DunningError> {
        queries::credits::top_up(&self.db, tenant_id, amount, reference_id)
            .await?
            .ok_or_else(|| DunningError::TenantNotFound(tenant_id.to_string()))
    }

    async fn credit_history(
        &self,
        tenant_id: &TenantId,
        limit: usize,
    ) -> Result<Vec<CreditTransaction>, DunningError> {
        queries::credits::history(&self.db, tenant_id, limit).await
    }
}

#[async_trait]
impl MessageLogStore for SqliteStore {
    async fn create_attempt(&self, attempt: NewMessageAttempt) -> Result<String, DunningError> {
        queries::message_log::insert_attempt(&self.db, &attempt).await
    }

    async fn mark_sent(
        &self,
        attempt_id: &str,
        provider_message_id: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<(), DunningError> {
        queries::message_log::mark_sent(&self.db, attempt_id, provider_message_id, sent_at).await
    }

    async fn mark_failed(
        &self,
        attempt_id: &str,
        error_code: Option<&str>,
        error_message: &str,
    ) -> Result<(), DunningError> {
        queries::message_log::mark_failed(&self.db, attempt_id, error_code, error_message).await
    }

    async fn get_attempt(&self, attempt_id: &str) -> Result<Option<MessageAttempt>, DunningError> {
        queries::message_log::get_attempt(&self.db, attempt_id).await
    }

    async fn list_attempts(
        &self,
        tenant_id: &TenantId,
        status: Option<MessageStatus>,
        limit: usize,
    ) -> Result<Vec<MessageAttempt>, DunningError> {
        queries::message_log::list_attempts(&self.db, tenant_id, status, limit).await
    }

    async fn count_by_status(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<(MessageStatus, u64)>, DunningError> {
        queries::message_log::count_by_status(&self.db, tenant_id).await
    }
}
