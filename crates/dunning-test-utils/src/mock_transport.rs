// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock message transport for deterministic testing.
//!
//! `MockTransport` implements `MessageTransport` with a FIFO script of
//! outcomes and captures every message handed to it.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use dunning_core::DunningError;
use dunning_core::traits::{MessageTransport, PluginAdapter};
use dunning_core::types::{AdapterType, HealthStatus, OutboundMessage, TransportReceipt};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Accept,
    Reject { code: String, message: String },
    ProviderExhausted { code: String },
}

/// A mock transport that replays scripted outcomes.
///
/// Outcomes are popped from a FIFO queue. When the queue is empty every
/// message is accepted with a generated `mock-sid-N` id.
pub struct MockTransport {
    script: Arc<Mutex<VecDeque<ScriptedReply>>>,
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    delay: Arc<Mutex<Option<Duration>>>,
    next_sid: AtomicU64,
}

impl MockTransport {
    /// Create a transport that accepts everything.
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            delay: Arc::new(Mutex::new(None)),
            next_sid: AtomicU64::new(1),
        }
    }

    /// Queue a provider rejection for the next unscripted call.
    pub async fn push_failure(&self, code: &str, message: &str) {
        self.script.lock().await.push_back(ScriptedReply::Reject {
            code: code.to_string(),
            message: message.to_string(),
        });
    }

    /// Queue an explicit acceptance, e.g. to place a failure later in the run.
    pub async fn push_success(&self) {
        self.script.lock().await.push_back(ScriptedReply::Accept);
    }

    /// Queue a reply saying the provider account itself is out of funds.
    pub async fn push_provider_exhausted(&self, code: &str) {
        self.script
            .lock()
            .await
            .push_back(ScriptedReply::ProviderExhausted {
                code: code.to_string(),
            });
    }

    /// Delay every subsequent send by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.lock().await = Some(delay);
    }

    /// Every message handed to `send()`, accepted or not, in call order.
    pub async fn sent_messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockTransport {
    fn name(&self) -> &str {
        "mock-transport"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, DunningError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DunningError> {
        Ok(())
    }
}

#[async_trait]
impl MessageTransport for MockTransport {
    async fn send(&self, message: OutboundMessage) -> Result<TransportReceipt, DunningError> {
        let delay = *self.delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.sent.lock().await.push(message);
        let reply = self
            .script
            .lock()
            .await
            .pop_front()
            .unwrap_or(ScriptedReply::Accept);

        match reply {
            ScriptedReply::Accept => {
                let n = self.next_sid.fetch_add(1, Ordering::SeqCst);
                Ok(TransportReceipt {
                    provider_message_id: format!("mock-sid-{n}"),
                })
            }
            ScriptedReply::Reject { code, message } => Err(DunningError::Transport {
                code: Some(code),
                message,
            }),
            ScriptedReply::ProviderExhausted { code } => {
                Err(DunningError::ProviderCreditsExhausted {
                    code,
                    message: "provider account balance exhausted".into(),
                })
            }
        }
    }
}
