// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the collaborators the dispatcher consumes.
//!
//! Store and transport adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` so they can be held as `Arc<dyn Trait>`.

pub mod adapter;
pub mod clock;
pub mod invoice;
pub mod message_log;
pub mod tenant;
pub mod transport;

pub use adapter::PluginAdapter;
pub use clock::{Clock, SystemClock};
pub use invoice::InvoiceStore;
pub use message_log::MessageLogStore;
pub use tenant::TenantSettingsStore;
pub use transport::MessageTransport;
