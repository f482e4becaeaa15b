//! Backend payload to [`DisplayEvent`] conversion helpers.
//!
//! Each adapter maps its own wire types item by item; this module holds the
//! date/time parsing they share and the collection step that drops
//! malformed items and applies the query limit.

use calreader_core::DisplayEvent;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};

/// Parses an RFC 3339 timestamp, keeping its offset.
pub fn parse_timestamp(value: &str) -> ProviderResult<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).map_err(|e| {
        ProviderError::malformed(format!("invalid timestamp {:?}", value)).with_source(e)
    })
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> ProviderResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| ProviderError::malformed(format!("invalid date {:?}", value)).with_source(e))
}

/// Parses a zone-less local timestamp (`2024-03-15T09:00:00.0000000`).
pub fn parse_naive(value: &str) -> ProviderResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").map_err(|e| {
        ProviderError::malformed(format!("invalid local timestamp {:?}", value)).with_source(e)
    })
}

/// Resolves a local timestamp in the named IANA zone.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant; times in
/// a DST gap are malformed.
pub fn resolve_in_zone(value: &str, zone: &str) -> ProviderResult<DateTime<FixedOffset>> {
    let naive = parse_naive(value)?;
    let tz: Tz = zone
        .parse()
        .map_err(|_| ProviderError::malformed(format!("unknown time zone {:?}", zone)))?;

    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
        .ok_or_else(|| {
            ProviderError::malformed(format!("{} does not exist in time zone {}", value, zone))
        })
}

/// Collects mapped items into at most `limit` events.
///
/// `map` returns `Ok(None)` for items that are intentionally skipped
/// (cancelled events) and `Err` for malformed ones, which are logged and
/// dropped.
pub fn collect_events<T, F>(provider: &str, items: Vec<T>, limit: usize, mut map: F) -> Vec<DisplayEvent>
where
    F: FnMut(T) -> ProviderResult<Option<DisplayEvent>>,
{
    let mut events = Vec::with_capacity(items.len().min(limit));
    for item in items {
        if events.len() >= limit {
            break;
        }
        match map(item) {
            Ok(Some(event)) => events.push(event),
            Ok(None) => {}
            Err(e) => warn!(provider, error = %e, "skipping malformed event"),
        }
    }
    debug!(provider, count = events.len(), "mapped events");
    events
}
