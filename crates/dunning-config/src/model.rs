// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the dunning dispatcher.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use chrono::{FixedOffset, Offset, Utc};
use dunning_core::MessageType;
use serde::{Deserialize, Serialize};

/// Top-level dunning configuration.
///
/// Every section is optional and falls back to its defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DunningConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Run schedule and run bounds.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Outbound WhatsApp provider settings.
    #[serde(default)]
    pub transport: TransportConfig,

    /// Provider template identifiers per message type.
    #[serde(default)]
    pub templates: TemplatesConfig,
}

/// Log output settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// SQLite storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("dunning").join("dunning.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("dunning.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Scheduler driver configuration. Read once at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Process-level switch for automatic runs.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Five-field cron expression. Must fire exactly once in every clock hour.
    #[serde(default = "default_schedule")]
    pub schedule: String,

    /// Business timezone as a fixed offset from UTC, in minutes.
    #[serde(default)]
    pub utc_offset_minutes: i32,

    /// Tenants processed in parallel within one run.
    #[serde(default = "default_max_concurrent_tenants")]
    pub max_concurrent_tenants: usize,

    /// Upper bound on the wall-clock duration of one run.
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,
}

impl SchedulerConfig {
    /// Business timezone. Out-of-range offsets (rejected by validation) fall back to UTC.
    pub fn business_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix())
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            schedule: default_schedule(),
            utc_offset_minutes: 0,
            max_concurrent_tenants: default_max_concurrent_tenants(),
            run_timeout_secs: default_run_timeout_secs(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_schedule() -> String {
    "0 * * * *".to_string()
}

fn default_max_concurrent_tenants() -> usize {
    1
}

fn default_run_timeout_secs() -> u64 {
    1800
}

/// Twilio-compatible WhatsApp API settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TransportConfig {
    #[serde(default = "default_provider_url")]
    pub provider_url: String,

    #[serde(default)]
    pub account_sid: Option<String>,

    #[serde(default)]
    pub auth_token: Option<String>,

    /// Sender number in E.164 form.
    #[serde(default)]
    pub from_number: Option<String>,

    /// Country code prefixed to bare national numbers.
    #[serde(default = "default_country_code")]
    pub default_country_code: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Provider error codes that mean the sending account is out of funds.
    #[serde(default)]
    pub budget_exhausted_codes: Vec<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            provider_url: default_provider_url(),
            account_sid: None,
            auth_token: None,
            from_number: None,
            default_country_code: default_country_code(),
            request_timeout_secs: default_request_timeout_secs(),
            budget_exhausted_codes: Vec::new(),
        }
    }
}

fn default_provider_url() -> String {
    "https://api.twilio.com".to_string()
}

fn default_country_code() -> String {
    "91".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Provider template identifiers. An unset entry makes that message type
/// unsendable.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TemplatesConfig {
    #[serde(default)]
    pub sales_invoice: Option<String>,
    #[serde(default)]
    pub purchase_invoice: Option<String>,
    #[serde(default)]
    pub payment_reminder: Option<String>,
    #[serde(default)]
    pub payment_notification: Option<String>,
}

impl TemplatesConfig {
    /// Template id for `message_type`, if configured and non-blank.
    pub fn template_for(&self, message_type: MessageType) -> Option<&str> {
        let id = match message_type {
            MessageType::SalesInvoice => &self.sales_invoice,
            MessageType::PurchaseInvoice => &self.purchase_invoice,
            MessageType::PaymentReminder => &self.payment_reminder,
            MessageType::PaymentNotification => &self.payment_notification,
        };
        id.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}
