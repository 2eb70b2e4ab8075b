// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-invoice dispatch pipeline.
//!
//! Order of operations for one invoice:
//! 1. normalize the recipient phone (no log row on failure)
//! 2. require one credit (no log row on denial)
//! 3. resolve the template id (no log row if unconfigured)
//! 4. create the `pending` attempt
//! 5. send, then either `sent` + debit, or `failed` + re-raise
//!
//! A log row exists only once a transport call is about to be made, and every
//! row created here leaves in exactly one of `sent` or `failed`.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use dunning_config::DunningConfig;
use dunning_config::model::TemplatesConfig;
use dunning_core::types::MESSAGE_SENT_REFERENCE;
use dunning_core::{
    BalanceChange, Clock, DunningError, Invoice, MessageLogStore, MessageTransport,
    NewMessageAttempt, OutboundMessage, Tenant, normalize_phone,
};
use dunning_credit::CreditGate;
use tracing::{debug, error, info, warn};

use crate::template::{message_type_for, reference_type_for, template_variables};

/// Result of a send the provider accepted.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub attempt_id: String,
    pub provider_message_id: String,
    /// Balance after the debit, when the debit succeeded.
    pub balance: Option<BalanceChange>,
    /// Debit failure after a successful send. The attempt stays `sent`.
    pub debit_error: Option<DunningError>,
}

/// Sends one invoice reminder and records its lifecycle.
#[derive(Clone)]
pub struct Dispatcher {
    gate: CreditGate,
    message_log: Arc<dyn MessageLogStore>,
    transport: Arc<dyn MessageTransport>,
    clock: Arc<dyn Clock>,
    templates: TemplatesConfig,
    default_country_code: String,
    send_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        gate: CreditGate,
        message_log: Arc<dyn MessageLogStore>,
        transport: Arc<dyn MessageTransport>,
        clock: Arc<dyn Clock>,
        config: &DunningConfig,
    ) -> Self {
        Self {
            gate,
            message_log,
            transport,
            clock,
            templates: config.templates.clone(),
            default_country_code: config.transport.default_country_code.clone(),
            send_timeout: Duration::from_secs(config.transport.request_timeout_secs),
        }
    }

    /// Dispatches a reminder for `invoice` on behalf of `tenant`.
    ///
    /// Returns an error without touching the log for validation, credit and
    /// template failures. Transport failures are recorded as `failed` and then
    /// returned.
    pub async fn dispatch(
        &self,
        tenant: &Tenant,
        invoice: &Invoice,
        today: NaiveDate,
    ) -> Result<DispatchOutcome, DunningError> {
        let recipient = &invoice.recipient;
        let phone = normalize_phone(recipient.phone.as_deref(), &self.default_country_code)
            .map_err(|e| DunningError::InvalidPhone {
                recipient_id: recipient.id.clone(),
                reason: e.to_string(),
            })?;

        self.gate.require(&tenant.id, 1).await?;

        let message_type = message_type_for(invoice.kind);
        let template_id = self
            .templates
            .template_for(message_type)
            .ok_or_else(|| DunningError::TemplateMissing {
                message_type: message_type.to_string(),
            })?
            .to_string();

        let variables = template_variables(&tenant.name, invoice, today);
        let attempt_id = self
            .message_log
            .create_attempt(NewMessageAttempt {
                tenant_id: tenant.id.clone(),
                recipient_type: recipient.recipient_type,
                recipient_id: recipient.id.clone(),
                recipient_phone: phone.clone(),
                message_type,
                reference_type: reference_type_for(invoice.kind).to_string(),
                reference_id: invoice.id.clone(),
                reference_number: invoice.invoice_number.clone(),
                template_id: template_id.clone(),
                template_variables: variables.clone(),
            })
            .await?;

        debug!(
            tenant_id = %tenant.id,
            invoice_id = %invoice.id,
            attempt_id = %attempt_id,
            "sending reminder"
        );

        let message = OutboundMessage {
            to: phone,
            template_id,
            variables,
        };
        let sent = match tokio::time::timeout(self.send_timeout, self.transport.send(message)).await
        {
            Ok(result) => result,
            Err(_) => Err(DunningError::Timeout {
                duration: self.send_timeout,
            }),
        };

        match sent {
            Ok(receipt) => {
                if let Err(e) = self
                    .message_log
                    .mark_sent(&attempt_id, &receipt.provider_message_id, self.clock.now())
                    .await
                {
                    error!(
                        tenant_id = %tenant.id,
                        attempt_id = %attempt_id,
                        error = %e,
                        "message was sent but its attempt could not be marked sent"
                    );
                }
                info!(
                    tenant_id = %tenant.id,
                    invoice_id = %invoice.id,
                    attempt_id = %attempt_id,
                    provider_message_id = %receipt.provider_message_id,
                    "reminder sent"
                );

                let (balance, debit_error) = match self
                    .gate
                    .debit(&tenant.id, 1, MESSAGE_SENT_REFERENCE, &attempt_id)
                    .await
                {
                    Ok(change) => (Some(change), None),
                    Err(e) => {
                        warn!(
                            tenant_id = %tenant.id,
                            attempt_id = %attempt_id,
                            error = %e,
                            "credit debit failed after send; needs manual reconciliation"
                        );
                        (None, Some(e))
                    }
                };

                Ok(DispatchOutcome {
                    attempt_id,
                    provider_message_id: receipt.provider_message_id,
                    balance,
                    debit_error,
                })
            }
            Err(e) => {
                let (code, message) = e.failure_detail();
                if let Err(log_err) = self
                    .message_log
                    .mark_failed(&attempt_id, code, &message)
                    .await
                {
                    error!(
                        tenant_id = %tenant.id,
                        attempt_id = %attempt_id,
                        error = %log_err,
                        "failed attempt could not be recorded"
                    );
                }
                warn!(
                    tenant_id = %tenant.id,
                    invoice_id = %invoice.id,
                    attempt_id = %attempt_id,
                    error_code = code.unwrap_or("none"),
                    error = %e,
                    "reminder send failed"
                );
                Err(e)
            }
        }
    }
}
