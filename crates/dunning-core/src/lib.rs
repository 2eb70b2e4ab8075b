// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the dunning reminder dispatcher.
//!
//! This crate provides the error type, domain types, and the adapter traits
//! through which the scheduler reaches invoices, tenant settings, the message
//! log, and the outbound transport.

pub mod error;
pub mod phone;
pub mod traits;
pub mod types;

pub use error::{DunningError, ErrorClass};
pub use phone::{PhoneError, normalize_phone};
pub use types::{
    AdapterType, BalanceChange, CreditTransaction, HealthStatus, Invoice, InvoiceKind,
    InvoiceStatus, MessageAttempt, MessageStatus, MessageType, MessagingPolicy,
    NewMessageAttempt, OutboundMessage, Recipient, RecipientType, ReminderFrequency,
    SchedulerPolicy, Tenant, TenantId, TransportReceipt,
};

pub use traits::{
    Clock, InvoiceStore, MessageLogStore, MessageTransport, PluginAdapter, SystemClock,
    TenantSettingsStore,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn adapter_type_round_trips_through_strum() {
        assert_eq!(AdapterType::Storage.to_string(), "Storage");
        assert_eq!(
            AdapterType::from_str("Transport").unwrap(),
            AdapterType::Transport
        );
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn traits_are_object_safe() {
        fn _store(_: &dyn InvoiceStore) {}
        fn _tenants(_: &dyn TenantSettingsStore) {}
        fn _log(_: &dyn MessageLogStore) {}
        fn _transport(_: &dyn MessageTransport) {}
        fn _clock(_: &dyn Clock) {}
    }
}
