//! Time helpers shared by the provider adapters and the query layer.
//!
//! Labels are always rendered in the offset the timestamp carries, so an
//! event created at 09:00 in `-03:00` shows as `09:00` regardless of where
//! the process runs.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveTime, TimeZone};

/// Format of the `day` label, e.g. `March 05`.
pub const DAY_LABEL_FORMAT: &str = "%B %d";

/// Format of the clock labels, e.g. `09:30`.
pub const CLOCK_FORMAT: &str = "%H:%M";

/// Returns midnight of the day `dt` falls on, in the same timezone.
///
/// When midnight does not exist locally (a DST gap at 00:00), `dt` itself is
/// returned.
pub fn start_of_day<Tz: TimeZone>(dt: &DateTime<Tz>) -> DateTime<Tz> {
    let midnight = dt.date_naive().and_time(NaiveTime::MIN);
    dt.timezone()
        .from_local_datetime(&midnight)
        .earliest()
        .unwrap_or_else(|| dt.clone())
}

/// Returns local midnight of the current day.
pub fn start_of_today() -> DateTime<FixedOffset> {
    start_of_day(&Local::now()).fixed_offset()
}

/// Renders the day label for a date.
pub fn day_label(date: NaiveDate) -> String {
    date.format(DAY_LABEL_FORMAT).to_string()
}

/// Renders a zero-padded 24-hour clock label in the timestamp's own offset.
pub fn clock_label(dt: &DateTime<FixedOffset>) -> String {
    dt.format(CLOCK_FORMAT).to_string()
}
