// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query functions. Each takes `&Database` and runs on the writer thread.

pub mod credits;
pub mod invoices;
pub mod message_log;
pub mod tenants;
