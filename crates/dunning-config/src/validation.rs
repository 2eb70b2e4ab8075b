// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use croner::Cron;

use crate::diagnostic::ConfigError;
use crate::model::DunningConfig;

/// Hours of occurrences enumerated when checking the schedule.
const SCHEDULE_CHECK_HOURS: i64 = 48;

const MIN_UTC_OFFSET_MINUTES: i32 = -12 * 60;
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Collects every semantic violation instead of failing fast.
pub fn validate_config(config: &DunningConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.storage.database_path.trim().is_empty() {
        errors.push(validation("storage.database_path must not be empty"));
    }

    // A disabled driver never parses its schedule, so a bad one is harmless.
    if config.scheduler.enabled
        && let Err(reason) = check_hourly_schedule(&config.scheduler.schedule)
    {
        errors.push(ConfigError::Schedule {
            expression: config.scheduler.schedule.clone(),
            reason,
        });
    }

    if config.scheduler.max_concurrent_tenants < 1 {
        errors.push(validation("scheduler.max_concurrent_tenants must be at least 1"));
    }

    if config.scheduler.run_timeout_secs < 1 {
        errors.push(validation("scheduler.run_timeout_secs must be at least 1"));
    }

    let offset = config.scheduler.utc_offset_minutes;
    if !(MIN_UTC_OFFSET_MINUTES..=MAX_UTC_OFFSET_MINUTES).contains(&offset) {
        errors.push(validation(format!(
            "scheduler.utc_offset_minutes must be within [{MIN_UTC_OFFSET_MINUTES}, {MAX_UTC_OFFSET_MINUTES}], got {offset}"
        )));
    }

    if config.transport.request_timeout_secs < 1 {
        errors.push(validation("transport.request_timeout_secs must be at least 1"));
    }

    let cc = &config.transport.default_country_code;
    if cc.is_empty() || cc.len() > 3 || !cc.bytes().all(|b| b.is_ascii_digit()) {
        errors.push(validation(format!(
            "transport.default_country_code must be 1-3 digits, got `{cc}`"
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}

/// Parses a five-field cron expression.
pub fn parse_schedule(expression: &str) -> Result<Cron, String> {
    expression
        .parse::<Cron>()
        .map_err(|e| format!("not a valid cron expression: {e}"))
}

/// Checks that `expression` fires exactly once in every clock hour.
///
/// Tenant send windows are one clock hour wide. A schedule that skips an hour
/// never observes tenants whose preferred hour it skipped; one that fires
/// twice in an hour would dispatch twice inside the same window.
pub fn check_hourly_schedule(expression: &str) -> Result<(), String> {
    let cron = parse_schedule(expression)?;

    let start: DateTime<Utc> = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| "schedule check start is ambiguous".to_string())?;
    let end = start + Duration::hours(SCHEDULE_CHECK_HOURS);

    let mut per_hour: BTreeMap<DateTime<Utc>, u32> = BTreeMap::new();
    let mut cursor = start;
    let mut inclusive = true;
    loop {
        let next = cron
            .find_next_occurrence(&cursor, inclusive)
            .map_err(|e| format!("cannot compute next occurrence: {e}"))?;
        if next >= end {
            break;
        }
        let hour = hour_floor(next);
        let count = per_hour.entry(hour).or_default();
        *count += 1;
        if *count > 1 {
            return Err(format!(
                "fires more than once in the hour starting {}",
                hour.format("%H:00")
            ));
        }
        cursor = next;
        inclusive = false;
    }

    for h in 0..SCHEDULE_CHECK_HOURS {
        let hour = start + Duration::hours(h);
        if !per_hour.contains_key(&hour) {
            return Err(format!(
                "never fires in the hour starting {}; some send hours would be missed",
                hour.format("%H:00")
            ));
        }
    }

    Ok(())
}

fn hour_floor(t: DateTime<Utc>) -> DateTime<Utc> {
    t - Duration::minutes(i64::from(t.minute())) - Duration::seconds(i64::from(t.second()))
        - Duration::nanoseconds(i64::from(t.nanosecond()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        assert!(validate_config(&DunningConfig::default()).is_ok());
    }

    #[test]
    fn hourly_schedules_pass() {
        assert!(check_hourly_schedule("0 * * * *").is_ok());
        assert!(check_hourly_schedule("15 * * * *").is_ok());
    }

    #[test]
    fn unparsable_schedule_is_rejected() {
        let err = check_hourly_schedule("every hour").unwrap_err();
        assert!(err.contains("not a valid cron expression"), "{err}");
    }

    #[test]
    fn daily_schedule_misses_hours() {
        let err = check_hourly_schedule("0 9 * * *").unwrap_err();
        assert!(err.contains("never fires"), "{err}");
    }

    #[test]
    fn sub_hourly_schedule_double_fires() {
        let err = check_hourly_schedule("*/30 * * * *").unwrap_err();
        assert!(err.contains("more than once"), "{err}");
    }

    #[test]
    fn bad_schedule_is_ignored_when_disabled() {
        let mut config = DunningConfig::default();
        config.scheduler.schedule = "0 9 * * *".into();
        assert!(matches!(
            validate_config(&config).unwrap_err().as_slice(),
            [ConfigError::Schedule { .. }]
        ));

        config.scheduler.enabled = false;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = DunningConfig::default();
        config.storage.database_path = " ".into();
        config.scheduler.max_concurrent_tenants = 0;
        config.scheduler.utc_offset_minutes = 900;
        config.transport.default_country_code = "+91".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(has_message(&errors, "database_path"));
        assert!(has_message(&errors, "max_concurrent_tenants"));
        assert!(has_message(&errors, "utc_offset_minutes"));
        assert!(has_message(&errors, "default_country_code"));
    }

    #[test]
    fn india_offset_is_in_range() {
        let mut config = DunningConfig::default();
        config.scheduler.utc_offset_minutes = 330;
        assert!(validate_config(&config).is_ok());
    }
}
