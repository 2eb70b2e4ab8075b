// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable log of outbound message attempts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::DunningError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{MessageAttempt, MessageStatus, NewMessageAttempt, TenantId};

/// Append and update access to message attempt records.
///
/// An attempt is created `pending` and moved to exactly one of `sent` or
/// `failed`. Transitions out of any state other than `pending` are rejected.
#[async_trait]
pub trait MessageLogStore: PluginAdapter {
    /// Persists a new attempt in `pending` state and returns its id.
    async fn create_attempt(&self, attempt: NewMessageAttempt) -> Result<String, DunningError>;

    async fn mark_sent(
        &self,
        attempt_id: &str,
        provider_message_id: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<(), DunningError>;

    async fn mark_failed(
        &self,
        attempt_id: &str,
        error_code: Option<&str>,
        error_message: &str,
    ) -> Result<(), DunningError>;

    async fn get_attempt(&self, attempt_id: &str) -> Result<Option<MessageAttempt>, DunningError>;

    /// Newest first, optionally filtered by status.
    async fn list_attempts(
        &self,
        tenant_id: &TenantId,
        status: Option<MessageStatus>,
        limit: usize,
    ) -> Result<Vec<MessageAttempt>, DunningError>;

    /// Number of attempts per status for the tenant. Statuses with no rows are omitted.
    async fn count_by_status(
        &self,
        tenant_id: &TenantId,
    ) -> Result<Vec<(MessageStatus, u64)>, DunningError>;
}
