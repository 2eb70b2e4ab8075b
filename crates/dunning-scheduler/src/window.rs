// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Send-window evaluation.
//!
//! Pure functions that decide whether a given local moment is a tenant's
//! sanctioned send moment. All inputs are business-local; conversion from UTC
//! happens once, in [`to_business_time`].
//!
//! The hour match is exact, so the driver must fire exactly once in every
//! clock hour for each preferred hour to be observed exactly once per day.
//! `dunning_config::check_hourly_schedule` enforces that at startup.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Timelike, Utc, Weekday};
use dunning_core::{ReminderFrequency, SchedulerPolicy};
use serde::Serialize;

/// A policy rule that vetoes sending right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum WindowVeto {
    OutsideSendHour { hour: u32, preferred_hour: u8 },
    FrequencyNotDue { frequency: ReminderFrequency },
    Weekend,
}

impl std::fmt::Display for WindowVeto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutsideSendHour {
                hour,
                preferred_hour,
            } => write!(f, "outside send hour ({hour:02}:00, preferred {preferred_hour:02}:00)"),
            Self::FrequencyNotDue { frequency } => write!(f, "{frequency} reminder not due"),
            Self::Weekend => f.write_str("weekend sends disabled"),
        }
    }
}

/// Converts a UTC instant to business-local wall-clock time.
pub fn to_business_time(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDateTime {
    now.with_timezone(&offset).naive_local()
}

pub fn is_within_send_hour(now: NaiveDateTime, preferred_send_hour: u8) -> bool {
    now.hour() == u32::from(preferred_send_hour)
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Whether `frequency` is due on `date`.
///
/// Monthly reminders go out on the 1st. When weekend sends are off and the 1st
/// is a Saturday or Sunday, they move to the following Monday (the 3rd or 2nd).
/// The weekday of the 1st is re-derived from `date` on every call.
pub fn should_fire_for_frequency(
    frequency: ReminderFrequency,
    send_on_weekends: bool,
    date: NaiveDate,
) -> bool {
    match frequency {
        ReminderFrequency::Daily => true,
        ReminderFrequency::Weekly => date.weekday() == Weekday::Mon,
        ReminderFrequency::Monthly => {
            let day = date.day();
            if day == 1 {
                return send_on_weekends || !is_weekend(date);
            }
            if send_on_weekends {
                return false;
            }
            date.with_day(1).is_some_and(|first| {
                matches!(
                    (first.weekday(), day),
                    (Weekday::Sat, 3) | (Weekday::Sun, 2)
                )
            })
        }
    }
}

/// Runs every window rule in order and returns the first veto.
pub fn evaluate(policy: &SchedulerPolicy, now: NaiveDateTime) -> Result<(), WindowVeto> {
    if !is_within_send_hour(now, policy.preferred_send_hour) {
        return Err(WindowVeto::OutsideSendHour {
            hour: now.hour(),
            preferred_hour: policy.preferred_send_hour,
        });
    }

    let date = now.date();
    if !should_fire_for_frequency(policy.reminder_frequency, policy.send_on_weekends, date) {
        return Err(WindowVeto::FrequencyNotDue {
            frequency: policy.reminder_frequency,
        });
    }

    // Monthly folds its weekend handling into the frequency rule.
    if policy.reminder_frequency != ReminderFrequency::Monthly
        && !policy.send_on_weekends
        && is_weekend(date)
    {
        return Err(WindowVeto::Weekend);
    }

    Ok(())
}
