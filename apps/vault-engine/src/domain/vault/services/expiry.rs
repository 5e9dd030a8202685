//! Weekly expiry schedule: Fridays at 08:00 UTC.

use chrono::{Datelike, Days, NaiveTime, TimeDelta, Weekday};

use crate::domain::shared::Timestamp;

const EXPIRY_HOUR_UTC: i64 = 8;
const WEEK_DAYS: u64 = 7;

/// First Friday 08:00 UTC strictly after `from`.
///
/// Returns `None` only at the end of the representable calendar.
#[must_use]
pub fn next_friday(from: Timestamp) -> Option<Timestamp> {
    let dt = from.as_datetime();
    let today = dt.weekday().num_days_from_monday();
    let friday = Weekday::Fri.num_days_from_monday();
    let days_ahead = (WEEK_DAYS as u32 + friday - today) % WEEK_DAYS as u32;

    let date = dt.date_naive().checked_add_days(Days::new(u64::from(days_ahead)))?;
    let friday_8am = date
        .and_time(NaiveTime::MIN)
        .and_utc()
        .checked_add_signed(TimeDelta::hours(EXPIRY_HOUR_UTC))?;

    if dt >= friday_8am {
        friday_8am
            .checked_add_days(Days::new(WEEK_DAYS))
            .map(Timestamp::new)
    } else {
        Some(Timestamp::new(friday_8am))
    }
}

/// Expiry for the option that follows `current_expiry`.
///
/// Chains weekly from the current expiry, but restarts from `now` when there
/// is no current option or the vault has sat idle for more than a week past
/// it.
#[must_use]
pub fn next_expiry(current_expiry: Option<Timestamp>, now: Timestamp) -> Option<Timestamp> {
    match current_expiry {
        Some(expiry) if now.seconds_since(expiry) <= WEEK_DAYS * 24 * 60 * 60 => {
            next_friday(expiry)
        }
        _ => next_friday(now),
    }
}
