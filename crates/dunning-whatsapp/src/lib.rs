// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp template message transport for the dunning dispatcher.
//!
//! This crate implements [`MessageTransport`] against a Twilio-compatible
//! Messages resource, sending pre-approved content templates with numbered
//! variables.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use dunning_config::model::TransportConfig;
use dunning_core::error::DunningError;
use dunning_core::traits::{MessageTransport, PluginAdapter};
use dunning_core::types::{AdapterType, HealthStatus, OutboundMessage, TransportReceipt};
use tracing::{debug, info};

use crate::client::{Credentials, WhatsAppClient};

/// WhatsApp transport implementing [`MessageTransport`].
///
/// Credential resolution order: config -> `TWILIO_ACCOUNT_SID` /
/// `TWILIO_AUTH_TOKEN` env vars -> error.
pub struct WhatsAppTransport {
    client: WhatsAppClient,
}

impl WhatsAppTransport {
    /// Creates a new transport from the given configuration.
    pub fn new(config: &TransportConfig) -> Result<Self, DunningError> {
        let account_sid = resolve_credential(
            &config.account_sid,
            "TWILIO_ACCOUNT_SID",
            "transport.account_sid",
        )?;
        let auth_token = resolve_credential(
            &config.auth_token,
            "TWILIO_AUTH_TOKEN",
            "transport.auth_token",
        )?;
        let from_number = config
            .from_number
            .as_deref()
            .map(|n| n.trim().trim_start_matches("whatsapp:").to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                DunningError::Config("transport.from_number is required to send messages".into())
            })?;

        let client = WhatsAppClient::new(
            &config.provider_url,
            Credentials {
                account_sid,
                auth_token,
                from_number,
            },
            Duration::from_secs(config.request_timeout_secs),
            config.budget_exhausted_codes.clone(),
        )?;

        info!(
            provider_url = config.provider_url,
            timeout_secs = config.request_timeout_secs,
            "WhatsApp transport initialized"
        );

        Ok(Self { client })
    }
}

#[async_trait]
impl PluginAdapter for WhatsAppTransport {
    fn name(&self) -> &str {
        "whatsapp"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, DunningError> {
        // Probing the provider would create billable traffic.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), DunningError> {
        debug!("WhatsApp transport shutting down");
        Ok(())
    }
}

#[async_trait]
impl MessageTransport for WhatsAppTransport {
    async fn send(&self, message: OutboundMessage) -> Result<TransportReceipt, DunningError> {
        let provider_message_id = self
            .client
            .send_template(&message.to, &message.template_id, &message.variables)
            .await?;
        Ok(TransportReceipt {
            provider_message_id,
        })
    }
}

/// Returns the configured value, or the environment fallback when unset or empty.
fn resolve_credential(
    config_value: &Option<String>,
    env_var: &str,
    key: &str,
) -> Result<String, DunningError> {
    if let Some(value) = config_value
        && !value.is_empty()
    {
        return Ok(value.clone());
    }

    std::env::var(env_var)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            DunningError::Config(format!(
                "{key} not found. Set it in config or the {env_var} environment variable."
            ))
        })
}
