// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the dunning reminder dispatcher.

use thiserror::Error;

/// The primary error type used across all dunning adapter traits and core operations.
#[derive(Debug, Error)]
pub enum DunningError {
    /// Configuration errors (invalid TOML, bad schedule expression, missing settings).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Outbound messaging is switched off for the tenant.
    #[error("messaging is disabled for tenant {tenant_id}")]
    MessagingDisabled { tenant_id: String },

    /// No provider template is configured for the message type.
    #[error("no template configured for message type {message_type}")]
    TemplateMissing { message_type: String },

    /// The recipient has no usable phone number.
    #[error("invalid phone number for recipient {recipient_id}: {reason}")]
    InvalidPhone {
        recipient_id: String,
        reason: String,
    },

    /// The tenant's prepaid balance cannot cover the requested credits.
    #[error("insufficient credits for tenant {tenant_id}: balance {balance}, required {required}")]
    InsufficientCredits {
        tenant_id: String,
        balance: i64,
        required: i64,
    },

    /// The message provider rejected the request or could not be reached.
    #[error("transport error{}: {message}", .code.as_ref().map(|c| format!(" [{c}]")).unwrap_or_default())]
    Transport {
        code: Option<String>,
        message: String,
    },

    /// The provider reported that the sending account itself is out of funds.
    #[error("provider credits exhausted [{code}]: {message}")]
    ProviderCreditsExhausted { code: String, message: String },

    /// The tenant does not exist or has no messaging settings row.
    #[error("tenant not found: {0}")]
    TenantNotFound(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Operator-facing classification of a [`DunningError`].
///
/// The orchestrator uses this to decide between skipping, stopping a tenant's
/// queue, and continuing with the next invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Expected steady-state skip (disabled switches, missing template).
    Configuration,
    /// Prepaid budget exhausted; stop spending for this tenant.
    AdmissionDenied,
    /// Bad input for a single invoice (phone number).
    Validation,
    /// Provider rejected the message or was unreachable.
    Transport,
    /// Store read/write failure.
    Storage,
    /// Anything else, including timeouts.
    Internal,
}

impl DunningError {
    /// Wraps any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(err),
        }
    }

    /// Classifies this error for failure-isolation decisions.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Config(_)
            | Self::MessagingDisabled { .. }
            | Self::TemplateMissing { .. } => ErrorClass::Configuration,
            Self::InsufficientCredits { .. } | Self::ProviderCreditsExhausted { .. } => {
                ErrorClass::AdmissionDenied
            }
            Self::InvalidPhone { .. } => ErrorClass::Validation,
            Self::Transport { .. } => ErrorClass::Transport,
            Self::Storage { .. } | Self::TenantNotFound(_) => ErrorClass::Storage,
            Self::Timeout { .. } | Self::Internal(_) => ErrorClass::Internal,
        }
    }

    /// Provider error code and message to record on a failed attempt.
    pub fn failure_detail(&self) -> (Option<&str>, String) {
        match self {
            Self::Transport { code, message } => (code.as_deref(), message.clone()),
            Self::ProviderCreditsExhausted { code, message } => {
                (Some(code.as_str()), message.clone())
            }
            Self::Timeout { .. } => (Some("timeout"), self.to_string()),
            other => (None, other.to_string()),
        }
    }

    /// Returns true when this error means the tenant's budget is spent.
    pub fn is_credit_exhaustion(&self) -> bool {
        self.class() == ErrorClass::AdmissionDenied
    }
}
