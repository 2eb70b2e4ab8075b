// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for dunning integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without a real messaging provider.
//!
//! # Components
//!
//! - [`MockTransport`] - Scripted message transport that captures sends
//! - [`FixedClock`] - Settable clock for window decisions
//! - [`FaultySettings`] - Settings store wrapper that fails calls on demand
//! - [`TestHarness`] - Temp SQLite store with seeding helpers

pub mod clock;
pub mod faulty_settings;
pub mod harness;
pub mod mock_transport;

pub use clock::FixedClock;
pub use faulty_settings::{DebitFault, FaultySettings};
pub use harness::TestHarness;
pub use mock_transport::{MockTransport, ScriptedReply};
