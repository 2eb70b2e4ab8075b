// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot templated message delivery.

use async_trait::async_trait;

use crate::error::DunningError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{OutboundMessage, TransportReceipt};

#[async_trait]
pub trait MessageTransport: PluginAdapter {
    /// Sends one templated message.
    ///
    /// Provider rejections and network failures surface as
    /// [`DunningError::Transport`]; a transport that knows the provider account
    /// is out of funds returns
    /// [`DunningError::ProviderCreditsExhausted`] instead.
    async fn send(&self, message: OutboundMessage) -> Result<TransportReceipt, DunningError>;
}
