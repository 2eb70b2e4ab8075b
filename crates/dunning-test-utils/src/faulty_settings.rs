// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Settings store wrapper with injectable faults.
//!
//! `FaultySettings` delegates to a real [`TenantSettingsStore`] and fails
//! selected calls on demand, so tests can reach the error paths of the
//! scheduler without corrupting the database.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use dunning_core::DunningError;
use dunning_core::traits::{PluginAdapter, TenantSettingsStore};
use dunning_core::types::{
    AdapterType, BalanceChange, CreditTransaction, HealthStatus, MessagingPolicy, Tenant,
    TenantId,
};

/// How a faulted debit fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitFault {
    /// The balance was drained between the admission check and the debit.
    InsufficientCredits,
    /// The ledger write itself failed.
    Storage,
}

fn injected_storage_error(what: &str) -> DunningError {
    DunningError::storage(std::io::Error::other(format!("injected {what} failure")))
}

pub struct FaultySettings {
    inner: Arc<dyn TenantSettingsStore>,
    list_failures: AtomicUsize,
    list_calls: AtomicUsize,
    policy_failures: Mutex<HashSet<TenantId>>,
    policy_reads: AtomicUsize,
    disable_after_reads: Mutex<Option<usize>>,
    debit_fault: Mutex<Option<DebitFault>>,
}

impl FaultySettings {
    pub fn new(inner: Arc<dyn TenantSettingsStore>) -> Self {
        Self {
            inner,
            list_failures: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            policy_failures: Mutex::new(HashSet::new()),
            policy_reads: AtomicUsize::new(0),
            disable_after_reads: Mutex::new(None),
            debit_fault: Mutex::new(None),
        }
    }

    /// Fail the next `times` calls to `list_active_tenants`.
    pub fn fail_tenant_list(&self, times: usize) {
        self.list_failures.store(times, Ordering::SeqCst);
    }

    /// Number of `list_active_tenants` calls so far, failed ones included.
    pub fn tenant_list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Fail every policy read for `tenant_id`.
    pub async fn fail_policy_for(&self, tenant_id: &TenantId) {
        self.policy_failures.lock().await.insert(tenant_id.clone());
    }

    /// Report messaging as disabled once `reads` policy reads have been served.
    pub async fn disable_messaging_after(&self, reads: usize) {
        self.policy_reads.store(0, Ordering::SeqCst);
        *self.disable_after_reads.lock().await = Some(reads);
    }

    /// Fail every debit with `fault`. The balance is left untouched.
    pub async fn fail_debits(&self, fault: DebitFault) {
        *self.debit_fault.lock().await = Some(fault);
    }
}

#[async_trait]
impl PluginAdapter for FaultySettings {
    fn name(&self) -> &str {
        "faulty-settings"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, DunningError> {
        self.inner.health_check().await
    }

    async fn shutdown(&self) -> Result<(), DunningError> {
        Ok(())
    }
}

#[async_trait]
impl TenantSettingsStore for FaultySettings {
    async fn list_active_tenants(&self) -> Result<Vec<Tenant>, DunningError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .list_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(injected_storage_error("tenant list"));
        }
        self.inner.list_active_tenants().await
    }

    async fn messaging_policy(
        &self,
        tenant_id: &TenantId,
    ) -> Result<MessagingPolicy, DunningError> {
        if self.policy_failures.lock().await.contains(tenant_id) {
            return Err(injected_storage_error("policy read"));
        }

        let mut policy = self.inner.messaging_policy(tenant_id).await?;
        let served = self.policy_reads.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = *self.disable_after_reads.lock().await
            && served >= limit
        {
            policy.enabled = false;
        }
        Ok(policy)
    }

    async fn debit_credits(
        &self,
        tenant_id: &TenantId,
        amount: i64,
        reference_type: &str,
        reference_id: &str,
    ) -> Result<BalanceChange, DunningError> {
        match *self.debit_fault.lock().await {
            Some(DebitFault::InsufficientCredits) => Err(DunningError::InsufficientCredits {
                tenant_id: tenant_id.to_string(),
                balance: 0,
                required: amount,
            }),
            Some(DebitFault::Storage) => Err(injected_storage_error("debit")),
            None => {
                self.inner
                    .debit_credits(tenant_id, amount, reference_type, reference_id)
                    .await
            }
        }
    }

    async fn top_up_credits(
        &self,
        tenant_id: &TenantId,
        amount: i64,
        reference_id: &str,
    ) -> Result<BalanceChange, DunningError> {
        self.inner
            .top_up_credits(tenant_id, amount, reference_id)
            .await
    }

    async fn credit_history(
        &self,
        tenant_id: &TenantId,
        limit: usize,
    ) -> Result<Vec<CreditTransaction>, DunningError> {
        self.inner.credit_history(tenant_id, limit).await
    }
}
