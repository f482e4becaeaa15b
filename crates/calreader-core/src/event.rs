//! Event types handed to rendering surfaces.
//!
//! - [`DisplayEvent`]: a provider-agnostic, display-ready calendar event
//! - [`EventQuery`]: the start/limit pair every provider is queried with
//! - [`GroupedEvents`]: events bucketed by calendar day

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use serde::Serialize;

use crate::time::{clock_label, day_label, start_of_today};

/// Number of events requested when the caller does not ask for a positive limit.
pub const DEFAULT_LIMIT: usize = 20;

/// A calendar event ready for display.
///
/// Instances can only be built through [`DisplayEvent::all_day`] and
/// [`DisplayEvent::timed`], which keeps the `all_day` flag consistent with
/// the clock fields: all-day events never carry a start/end time and timed
/// events always carry both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayEvent {
    day: String,
    start_time: Option<String>,
    end_time: Option<String>,
    start_timestamp: DateTime<FixedOffset>,
    all_day: bool,
    description: String,
}

impl DisplayEvent {
    /// Creates an all-day event for `date`.
    ///
    /// The start timestamp is midnight UTC of that date.
    pub fn all_day(date: NaiveDate, description: impl Into<String>) -> Self {
        let start_timestamp = date.and_time(NaiveTime::MIN).and_utc().fixed_offset();

        Self {
            day: day_label(date),
            start_time: None,
            end_time: None,
            start_timestamp,
            all_day: true,
            description: description.into(),
        }
    }

    /// Creates a timed event; labels are rendered in each timestamp's own offset.
    pub fn timed(
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            day: day_label(start.date_naive()),
            start_time: Some(clock_label(&start)),
            end_time: Some(clock_label(&end)),
            start_timestamp: start,
            all_day: false,
            description: description.into(),
        }
    }

    /// The `"<Month> <DD>"` day label.
    pub fn day(&self) -> &str {
        &self.day
    }

    /// Start clock time (`HH:MM`), `None` for all-day events.
    pub fn start_time(&self) -> Option<&str> {
        self.start_time.as_deref()
    }

    /// End clock time (`HH:MM`), `None` for all-day events.
    pub fn end_time(&self) -> Option<&str> {
        self.end_time.as_deref()
    }

    /// Full-precision start, in the offset the provider reported.
    pub fn start_timestamp(&self) -> DateTime<FixedOffset> {
        self.start_timestamp
    }

    pub fn is_all_day(&self) -> bool {
        self.all_day
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// A query for events starting at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventQuery {
    /// Lower bound for event start.
    pub start: DateTime<FixedOffset>,
    /// Maximum number of events each provider returns.
    pub limit: usize,
}

impl EventQuery {
    /// Creates a query; a `limit` of zero or less falls back to [`DEFAULT_LIMIT`].
    pub fn new(start: DateTime<FixedOffset>, limit: i64) -> Self {
        let limit = if limit <= 0 {
            DEFAULT_LIMIT
        } else {
            usize::try_from(limit).unwrap_or(usize::MAX)
        };
        Self { start, limit }
    }

    /// Creates a query starting at local midnight of the current day.
    pub fn starting_today(limit: i64) -> Self {
        Self::new(start_of_today(), limit)
    }
}

/// Events bucketed by `YYYY-MM-DD` of their start timestamp.
pub type GroupedEvents = BTreeMap<String, Vec<DisplayEvent>>;

/// Groups events by the calendar date of their start timestamp.
///
/// The order of events inside a day is the order they were given in.
pub fn group_events_by_day(events: &[DisplayEvent]) -> GroupedEvents {
    let mut grouped = GroupedEvents::new();
    for event in events {
        let key = event.start_timestamp.format("%Y-%m-%d").to_string();
        grouped.entry(key).or_default().push(event.clone());
    }
    grouped
}
