// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prepaid message-credit admission control.
//!
//! [`CreditGate`] answers "may this tenant spend N credits right now?" without
//! side effects, and performs the atomic debit once a message has actually
//! been accepted by the provider. Low balances are reported as warnings but
//! never block a send on their own.

pub mod gate;

pub use gate::{Availability, CreditGate, DenialReason};
