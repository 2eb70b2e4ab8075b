// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Availability checks and debits over a [`TenantSettingsStore`].

use std::sync::Arc;

use dunning_core::types::TOP_UP_REFERENCE;
use dunning_core::{BalanceChange, DunningError, TenantId, TenantSettingsStore};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Why an availability check said no.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    MessagingDisabled,
    InsufficientCredits,
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MessagingDisabled => f.write_str("messaging is disabled"),
            Self::InsufficientCredits => f.write_str("insufficient credits"),
        }
    }
}

/// Snapshot answer to "can this tenant spend `required` credits?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Availability {
    pub allowed: bool,
    pub current_balance: i64,
    pub low_credit_warning: bool,
    pub threshold: i64,
    pub reason: Option<DenialReason>,
}

impl Availability {
    /// Converts a denial into the matching error.
    pub fn into_result(self, tenant_id: &TenantId, required: i64) -> Result<Self, DunningError> {
        match self.reason {
            None => Ok(self),
            Some(DenialReason::MessagingDisabled) => Err(DunningError::MessagingDisabled {
                tenant_id: tenant_id.to_string(),
            }),
            Some(DenialReason::InsufficientCredits) => Err(DunningError::InsufficientCredits {
                tenant_id: tenant_id.to_string(),
                balance: self.current_balance,
                required,
            }),
        }
    }
}

/// Credit admission control for one settings store.
#[derive(Clone)]
pub struct CreditGate {
    store: Arc<dyn TenantSettingsStore>,
}

impl CreditGate {
    pub fn new(store: Arc<dyn TenantSettingsStore>) -> Self {
        Self { store }
    }

    /// Reads the balance and reports whether `required` credits are available.
    /// Never mutates state.
    pub async fn check_availability(
        &self,
        tenant_id: &TenantId,
        required: i64,
    ) -> Result<Availability, DunningError> {
        let policy = self.store.messaging_policy(tenant_id).await?;

        let reason = if !policy.enabled {
            Some(DenialReason::MessagingDisabled)
        } else if policy.credit_balance < required {
            Some(DenialReason::InsufficientCredits)
        } else {
            None
        };

        let availability = Availability {
            allowed: reason.is_none(),
            current_balance: policy.credit_balance,
            low_credit_warning: policy.is_low_credit(),
            threshold: policy.low_credit_threshold,
            reason,
        };

        if let Some(reason) = reason {
            debug!(
                tenant_id = %tenant_id,
                balance = policy.credit_balance,
                required,
                %reason,
                "credit check denied"
            );
        }

        Ok(availability)
    }

    /// Like [`check_availability`](Self::check_availability) but returns the
    /// denial as an error.
    pub async fn require(
        &self,
        tenant_id: &TenantId,
        required: i64,
    ) -> Result<Availability, DunningError> {
        self.check_availability(tenant_id, required)
            .await?
            .into_result(tenant_id, required)
    }

    /// Atomically subtracts `amount` and records a ledger entry.
    ///
    /// Fails with [`DunningError::InsufficientCredits`] if the balance cannot
    /// cover `amount` at the moment of the write.
    pub async fn debit(
        &self,
        tenant_id: &TenantId,
        amount: i64,
        reason: &str,
        reference_id: &str,
    ) -> Result<BalanceChange, DunningError> {
        let change = self
            .store
            .debit_credits(tenant_id, amount, reason, reference_id)
            .await?;

        if change.low_credit_warning() {
            warn!(
                tenant_id = %tenant_id,
                balance = change.new_balance,
                threshold = change.low_credit_threshold,
                "low credit balance"
            );
        } else {
            debug!(tenant_id = %tenant_id, balance = change.new_balance, "credits debited");
        }

        Ok(change)
    }

    /// Adds purchased credits.
    pub async fn top_up(
        &self,
        tenant_id: &TenantId,
        amount: i64,
        reference_id: &str,
    ) -> Result<BalanceChange, DunningError> {
        let change = self
            .store
            .top_up_credits(tenant_id, amount, reference_id)
            .await?;
        info!(
            tenant_id = %tenant_id,
            amount,
            balance = change.new_balance,
            reference_type = TOP_UP_REFERENCE,
            reference_id,
            "credits topped up"
        );
        Ok(change)
    }
}
