// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the adapter traits and the dispatcher.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Identifier of an isolated customer account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantId(pub String);

impl TenantId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenantId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Transport,
}

// --- Tenant policy ---

/// How often automatic reminders fire for a tenant.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReminderFrequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

/// Automatic-reminder settings for one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerPolicy {
    pub enabled: bool,
    /// Hour of day (0-23) in the business offset at which reminders fire.
    pub preferred_send_hour: u8,
    pub reminder_frequency: ReminderFrequency,
    pub send_on_weekends: bool,
}

impl Default for SchedulerPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            preferred_send_hour: 9,
            reminder_frequency: ReminderFrequency::Daily,
            send_on_weekends: true,
        }
    }
}

/// Messaging configuration and credit position of a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagingPolicy {
    pub enabled: bool,
    pub credit_balance: i64,
    pub low_credit_threshold: i64,
    pub scheduler: SchedulerPolicy,
}

impl MessagingPolicy {
    /// Advisory flag; never blocks a send on its own.
    pub fn is_low_credit(&self) -> bool {
        self.credit_balance <= self.low_credit_threshold
    }
}

/// A tenant known to the settings store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
}

// --- Invoices ---

/// Sales invoices are owed to the tenant; purchase invoices are owed by it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InvoiceKind {
    Sales,
    Purchase,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Unpaid,
    PartiallyPaid,
    Paid,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RecipientType {
    Vendor,
    Retailer,
}

/// Counterparty of an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub recipient_type: RecipientType,
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
}

/// Read-only view of a sales or purchase invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub kind: InvoiceKind,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub status: InvoiceStatus,
    /// Balance due (sales) or amount due (purchase).
    pub outstanding_amount: Decimal,
    pub recipient: Recipient,
}

impl Invoice {
    /// Unpaid or partially paid, with money outstanding, dated strictly before `today`.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(
            self.status,
            InvoiceStatus::Unpaid | InvoiceStatus::PartiallyPaid
        ) && self.outstanding_amount > Decimal::ZERO
            && self.invoice_date < today
    }
}

// --- Message log ---

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    SalesInvoice,
    PurchaseInvoice,
    PaymentReminder,
    PaymentNotification,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Pending,
    Sent,
    Delivered,
    Read,
    Failed,
}

impl MessageStatus {
    /// The only states this dispatcher ever leaves an attempt in.
    pub fn is_terminal_for_dispatch(self) -> bool {
        matches!(self, Self::Sent | Self::Failed)
    }
}

/// Fields supplied when an attempt is first logged in `pending` state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessageAttempt {
    pub tenant_id: TenantId,
    pub recipient_type: RecipientType,
    pub recipient_id: String,
    pub recipient_phone: String,
    pub message_type: MessageType,
    pub reference_type: String,
    pub reference_id: String,
    pub reference_number: String,
    pub template_id: String,
    pub template_variables: BTreeMap<String, String>,
}

/// A persisted message attempt as stored in the message log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAttempt {
    pub id: String,
    pub tenant_id: TenantId,
    pub recipient_type: RecipientType,
    pub recipient_id: String,
    pub recipient_phone: String,
    pub message_type: MessageType,
    pub reference_type: String,
    pub reference_id: String,
    pub reference_number: String,
    pub template_id: String,
    pub status: MessageStatus,
    pub template_variables: BTreeMap<String, String>,
    pub provider_message_id: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    pub cost: Option<Decimal>,
    pub cost_currency: Option<String>,
    pub created_at: DateTime<Utc>,
}

// --- Credits ---

/// Reference type written on ledger entries produced by a successful send.
pub const MESSAGE_SENT_REFERENCE: &str = "message_sent";

/// Reference type written on ledger entries produced by a credit purchase.
pub const TOP_UP_REFERENCE: &str = "top_up";

/// Immutable credit ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditTransaction {
    pub id: String,
    pub tenant_id: TenantId,
    /// Negative for debits.
    pub amount: i64,
    pub balance_after: i64,
    pub reference_type: String,
    pub reference_id: String,
    pub created_at: DateTime<Utc>,
}

/// Result of an applied debit or top-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceChange {
    pub new_balance: i64,
    pub low_credit_threshold: i64,
}

impl BalanceChange {
    pub fn low_credit_warning(&self) -> bool {
        self.new_balance <= self.low_credit_threshold
    }
}

// --- Transport ---

/// One templated message handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Recipient in E.164 form (`+<country><number>`).
    pub to: String,
    pub template_id: String,
    pub variables: BTreeMap<String, String>,
}

/// Provider acknowledgement of an accepted message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportReceipt {
    pub provider_message_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn invoice(status: InvoiceStatus, amount: &str, date: NaiveDate) -> Invoice {
        Invoice {
            id: "inv-1".into(),
            kind: InvoiceKind::Sales,
            invoice_number: "S-001".into(),
            invoice_date: date,
            status,
            outstanding_amount: Decimal::from_str(amount).unwrap(),
            recipient: Recipient {
                recipient_type: RecipientType::Retailer,
                id: "r1".into(),
                name: "Corner Shop".into(),
                phone: Some("9876543210".into()),
            },
        }
    }

    #[test]
    fn overdue_requires_open_status_positive_amount_and_past_date() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 10).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap();

        assert!(invoice(InvoiceStatus::Unpaid, "10.00", yesterday).is_overdue(today));
        assert!(invoice(InvoiceStatus::PartiallyPaid, "0.01", yesterday).is_overdue(today));
        assert!(!invoice(InvoiceStatus::Paid, "10.00", yesterday).is_overdue(today));
        assert!(!invoice(InvoiceStatus::Unpaid, "0", yesterday).is_overdue(today));
        assert!(!invoice(InvoiceStatus::Unpaid, "10.00", today).is_overdue(today));
    }

    #[test]
    fn scheduler_policy_defaults() {
        let policy = SchedulerPolicy::default();
        assert!(policy.enabled);
        assert_eq!(policy.preferred_send_hour, 9);
        assert_eq!(policy.reminder_frequency, ReminderFrequency::Daily);
        assert!(policy.send_on_weekends);
    }

    #[test]
    fn low_credit_is_inclusive_of_threshold() {
        let mut policy = MessagingPolicy {
            enabled: true,
            credit_balance: 10,
            low_credit_threshold: 10,
            scheduler: SchedulerPolicy::default(),
        };
        assert!(policy.is_low_credit());
        policy.credit_balance = 11;
        assert!(!policy.is_low_credit());
    }

    #[test]
    fn enums_use_snake_case_wire_names() {
        assert_eq!(MessageType::PaymentReminder.to_string(), "payment_reminder");
        assert_eq!(
            InvoiceStatus::from_str("partially_paid").unwrap(),
            InvoiceStatus::PartiallyPaid
        );
        assert_eq!(
            serde_json::to_string(&ReminderFrequency::Weekly).unwrap(),
            "\"weekly\""
        );
        assert_eq!(RecipientType::from_str("vendor").unwrap(), RecipientType::Vendor);
    }

    #[test]
    fn only_sent_and_failed_are_dispatch_terminal() {
        assert!(MessageStatus::Sent.is_terminal_for_dispatch());
        assert!(MessageStatus::Failed.is_terminal_for_dispatch());
        assert!(!MessageStatus::Pending.is_terminal_for_dispatch());
    }
}
