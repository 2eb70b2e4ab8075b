// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles a temp SQLite store, a [`MockTransport`], and a
//! [`FixedClock`], plus helpers that seed tenants and invoices through the
//! storage queries.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use dunning_config::DunningConfig;
use dunning_config::model::{StorageConfig, TemplatesConfig};
use dunning_core::{
    Clock, CreditTransaction, DunningError, Invoice, InvoiceKind, InvoiceStatus, MessageAttempt,
    MessageLogStore, MessagingPolicy, Recipient, RecipientType, SchedulerPolicy, Tenant,
    TenantId, TenantSettingsStore,
};
use dunning_credit::CreditGate;
use dunning_storage::SqliteStore;
use dunning_storage::queries::{invoices, tenants};
use rust_decimal::Decimal;

use crate::clock::FixedClock;
use crate::mock_transport::MockTransport;

/// Low-credit threshold given to tenants created by [`TestHarness::add_tenant`].
pub const DEFAULT_LOW_CREDIT_THRESHOLD: i64 = 2;

/// A complete test environment with a mock transport and temp storage.
pub struct TestHarness {
    /// SQLite store (temp DB, cleaned up on drop).
    pub store: Arc<SqliteStore>,
    pub transport: Arc<MockTransport>,
    /// Starts at Tuesday 2026-03-10 09:00 UTC.
    pub clock: Arc<FixedClock>,
    /// Defaults with every template configured and the temp DB path.
    pub config: DunningConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub async fn new() -> Result<Self, DunningError> {
        let temp_dir = tempfile::TempDir::new().map_err(DunningError::storage)?;
        let db_path = temp_dir.path().join("dunning-test.db");

        let storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
            wal_mode: true,
        };
        let store = Arc::new(SqliteStore::open(&storage).await?);

        let start = Utc
            .with_ymd_and_hms(2026, 3, 10, 9, 0, 0)
            .single()
            .ok_or_else(|| DunningError::Internal("invalid harness start time".into()))?;

        let config = DunningConfig {
            storage,
            templates: TemplatesConfig {
                sales_invoice: Some("HX_sales_invoice".into()),
                purchase_invoice: Some("HX_purchase_invoice".into()),
                payment_reminder: Some("HX_payment_reminder".into()),
                payment_notification: Some("HX_payment_notification".into()),
            },
            ..DunningConfig::default()
        };

        Ok(Self {
            store,
            transport: Arc::new(MockTransport::new()),
            clock: Arc::new(FixedClock::new(start)),
            config,
            _temp_dir: temp_dir,
        })
    }

    pub fn offset(&self) -> FixedOffset {
        self.config.scheduler.business_offset()
    }

    /// Business-local date of the clock.
    pub fn today(&self) -> NaiveDate {
        self.clock.now().with_timezone(&self.offset()).date_naive()
    }

    pub fn days_ago(&self, days: i64) -> NaiveDate {
        self.today() - Duration::days(days)
    }

    /// Moves the clock to `hour:00` UTC on `date`.
    pub fn set_time(&self, date: NaiveDate, hour: u32) {
        if let Some(at) = date.and_hms_opt(hour, 0, 0) {
            self.clock.set(DateTime::from_naive_utc_and_offset(at, Utc));
        }
    }

    pub fn credit_gate(&self) -> CreditGate {
        CreditGate::new(self.store.clone())
    }

    /// Creates an active tenant with messaging enabled and the given balance.
    pub async fn add_tenant(
        &self,
        id: &str,
        name: &str,
        balance: i64,
        scheduler: SchedulerPolicy,
    ) -> Result<Tenant, DunningError> {
        self.add_tenant_with_policy(
            id,
            name,
            true,
            MessagingPolicy {
                enabled: true,
                credit_balance: balance,
                low_credit_threshold: DEFAULT_LOW_CREDIT_THRESHOLD,
                scheduler,
            },
        )
        .await
    }

    pub async fn add_tenant_with_policy(
        &self,
        id: &str,
        name: &str,
        active: bool,
        policy: MessagingPolicy,
    ) -> Result<Tenant, DunningError> {
        let tenant = Tenant {
            id: TenantId::from(id),
            name: name.to_string(),
        };
        let db = self.store.database();
        tenants::upsert_tenant(db, &tenant, active).await?;
        tenants::set_messaging_policy(db, &tenant.id, &policy).await?;
        Ok(tenant)
    }

    /// Seeds an unpaid sales invoice of 100.00 owed by a new retailer.
    pub async fn add_sales_invoice(
        &self,
        tenant: &Tenant,
        number: &str,
        date: NaiveDate,
        phone: Option<&str>,
    ) -> Result<Invoice, DunningError> {
        self.add_invoice(tenant, InvoiceKind::Sales, number, date, phone)
            .await
    }

    /// Seeds an unpaid purchase invoice of 100.00 owed to a new vendor.
    pub async fn add_purchase_invoice(
        &self,
        tenant: &Tenant,
        number: &str,
        date: NaiveDate,
        phone: Option<&str>,
    ) -> Result<Invoice, DunningError> {
        self.add_invoice(tenant, InvoiceKind::Purchase, number, date, phone)
            .await
    }

    async fn add_invoice(
        &self,
        tenant: &Tenant,
        kind: InvoiceKind,
        number: &str,
        date: NaiveDate,
        phone: Option<&str>,
    ) -> Result<Invoice, DunningError> {
        let (recipient_type, prefix) = match kind {
            InvoiceKind::Sales => (RecipientType::Retailer, "retailer"),
            InvoiceKind::Purchase => (RecipientType::Vendor, "vendor"),
        };
        let invoice = Invoice {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            invoice_number: number.to_string(),
            invoice_date: date,
            status: InvoiceStatus::Unpaid,
            outstanding_amount: Decimal::new(10_000, 2),
            recipient: Recipient {
                recipient_type,
                id: format!("{prefix}-{}-{number}", tenant.id),
                name: format!("{prefix} {number}"),
                phone: phone.map(str::to_string),
            },
        };

        let db = self.store.database();
        invoices::upsert_counterparty(db, &tenant.id, &invoice.recipient).await?;
        invoices::insert_invoice(db, &tenant.id, &invoice, invoice.outstanding_amount).await?;
        Ok(invoice)
    }

    pub async fn balance(&self, tenant: &Tenant) -> Result<i64, DunningError> {
        Ok(self.store.messaging_policy(&tenant.id).await?.credit_balance)
    }

    /// Every attempt for the tenant, newest first.
    pub async fn attempts(&self, tenant: &Tenant) -> Result<Vec<MessageAttempt>, DunningError> {
        self.store.list_attempts(&tenant.id, None, 10_000).await
    }

    pub async fn attempt(&self, id: &str) -> Result<Option<MessageAttempt>, DunningError> {
        self.store.get_attempt(id).await
    }

    pub async fn credit_history(
        &self,
        tenant: &Tenant,
    ) -> Result<Vec<CreditTransaction>, DunningError> {
        self.store.credit_history(&tenant.id, 10_000).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[tokio::test]
    async fn seeds_tenant_and_invoices() {
        let harness = TestHarness::new().await.unwrap();
        assert_eq!(harness.today().weekday(), chrono::Weekday::Tue);

        let tenant = harness
            .add_tenant("t1", "Acme", 3, SchedulerPolicy::default())
            .await
            .unwrap();
        harness
            .add_sales_invoice(&tenant, "S-1", harness.days_ago(2), Some("9876543210"))
            .await
            .unwrap();
        harness
            .add_purchase_invoice(&tenant, "P-1", harness.days_ago(2), None)
            .await
            .unwrap();

        assert_eq!(harness.balance(&tenant).await.unwrap(), 3);
        let active = harness.store.list_active_tenants().await.unwrap();
        assert_eq!(active, vec![tenant]);
    }
}
