//! Microsoft Graph `calendarView` client.

use calreader_core::{DisplayEvent, EventQuery};
use chrono::{Duration, SecondsFormat};
use serde::Deserialize;
use tracing::debug;

use crate::credential::AuthorizedClient;
use crate::error::{ProviderError, ProviderResult};
use crate::http::fetch_json;
use crate::normalize::{parse_naive, resolve_in_zone};

const SELECT_FIELDS: &str = "subject,start,end,isAllDay,isCancelled";

/// Graph client bound to one access token.
#[derive(Debug)]
pub(crate) struct GraphCalendarClient<'a> {
    auth: AuthorizedClient,
    api_base: &'a str,
    time_zone: &'a str,
}

impl<'a> GraphCalendarClient<'a> {
    pub(crate) fn new(auth: AuthorizedClient, api_base: &'a str, time_zone: &'a str) -> Self {
        Self {
            auth,
            api_base,
            time_zone,
        }
    }

    /// Lists event occurrences between `query.start` and `query.start + horizon`.
    ///
    /// `calendarView` expands recurring series into instances.
    pub(crate) async fn calendar_view(
        &self,
        query: &EventQuery,
        horizon: Duration,
    ) -> ProviderResult<Vec<GraphEvent>> {
        let url = format!("{}/me/calendarView", self.api_base.trim_end_matches('/'));
        let end = query.start.checked_add_signed(horizon).ok_or_else(|| {
            ProviderError::configuration(format!("horizon of {} days is out of range", horizon.num_days()))
        })?;

        let request = self
            .auth
            .get(&url)
            .header("Prefer", format!("outlook.timezone=\"{}\"", self.time_zone))
            .query(&[
                ("startDateTime", query.start.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ("endDateTime", end.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ("$top", query.limit.to_string()),
                ("$orderby", "start/dateTime".to_string()),
                ("$select", SELECT_FIELDS.to_string()),
            ]);

        let response: CalendarViewResponse = fetch_json(request).await?;
        debug!(count = response.value.len(), "fetched Outlook events");
        Ok(response.value)
    }
}

#[derive(Debug, Deserialize)]
struct CalendarViewResponse {
    #[serde(default)]
    value: Vec<GraphEvent>,
}

/// A single event from Microsoft Graph.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphEvent {
    subject: Option<String>,
    #[serde(default)]
    is_all_day: bool,
    #[serde(default)]
    is_cancelled: bool,
    start: GraphDateTime,
    end: GraphDateTime,
}

/// `dateTimeTimeZone`: a zone-less local time plus the zone it is in.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphDateTime {
    date_time: String,
    time_zone: Option<String>,
}

impl GraphDateTime {
    fn zone(&self) -> &str {
        self.time_zone.as_deref().unwrap_or("UTC")
    }
}

impl GraphEvent {
    /// Maps the event; cancelled occurrences yield `Ok(None)`.
    pub(crate) fn into_display_event(self) -> ProviderResult<Option<DisplayEvent>> {
        if self.is_cancelled {
            return Ok(None);
        }

        let description = self.subject.unwrap_or_default();

        if self.is_all_day {
            let date = parse_naive(&self.start.date_time)?.date();
            return Ok(Some(DisplayEvent::all_day(date, description)));
        }

        let start = resolve_in_zone(&self.start.date_time, self.start.zone())?;
        let end = resolve_in_zone(&self.end.date_time, self.end.zone())?;
        Ok(Some(DisplayEvent::timed(start, end, description)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;

    fn event(json: &str) -> GraphEvent {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parse_calendar_view_response() {
        let json = r#"{
            "@odata.context": "https://graph.microsoft.com/v1.0/$metadata#users('me')/calendarView",
            "value": [
                {
                    "subject": "Planning",
                    "isAllDay": false,
                    "isCancelled": false,
                    "start": {"dateTime": "2024-03-15T09:00:00.0000000", "timeZone": "UTC"},
                    "end": {"dateTime": "2024-03-15T10:00:00.0000000", "timeZone": "UTC"}
                }
            ]
        }"#;
        let response: CalendarViewResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.value.len(), 1);
        assert_eq!(response.value[0].subject.as_deref(), Some("Planning"));
    }

    #[test]
    fn maps_timed_event_in_reported_zone() {
        let mapped = event(
            r#"{"subject":"Sync","start":{"dateTime":"2024-07-01T09:00:00.0000000","timeZone":"Europe/Paris"},
                "end":{"dateTime":"2024-07-01T10:30:00.0000000","timeZone":"Europe/Paris"}}"#,
        )
        .into_display_event()
        .unwrap()
        .unwrap();

        assert_eq!(mapped.start_time(), Some("09:00"));
        assert_eq!(mapped.end_time(), Some("10:30"));
        assert_eq!(mapped.day(), "July 01");
        assert_eq!(mapped.start_timestamp().offset().local_minus_utc(), 2 * 3600);
    }

    #[test]
    fn maps_all_day_event_from_date_part() {
        let mapped = event(
            r#"{"subject":"Offsite","isAllDay":true,
                "start":{"dateTime":"2024-03-15T00:00:00.0000000","timeZone":"UTC"},
                "end":{"dateTime":"2024-03-16T00:00:00.0000000","timeZone":"UTC"}}"#,
        )
        .into_display_event()
        .unwrap()
        .unwrap();

        assert!(mapped.is_all_day());
        assert_eq!(mapped.day(), "March 15");
        assert_eq!(mapped.end_time(), None);
    }

    #[test]
    fn skips_cancelled_occurrence() {
        let mapped = event(
            r#"{"subject":"Gone","isCancelled":true,
                "start":{"dateTime":"2024-03-15T09:00:00","timeZone":"UTC"},
                "end":{"dateTime":"2024-03-15T10:00:00","timeZone":"UTC"}}"#,
        )
        .into_display_event()
        .unwrap();
        assert!(mapped.is_none());
    }

    #[test]
    fn unparsable_time_is_malformed() {
        let err = event(
            r#"{"subject":"Bad","start":{"dateTime":"soon","timeZone":"UTC"},
                "end":{"dateTime":"2024-03-15T10:00:00","timeZone":"UTC"}}"#,
        )
        .into_display_event()
        .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::MalformedEventData);
    }
}
