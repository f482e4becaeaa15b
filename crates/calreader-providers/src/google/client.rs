//! Google Calendar API client.

use calreader_core::{DisplayEvent, EventQuery};
use serde::Deserialize;
use tracing::debug;

use crate::credential::AuthorizedClient;
use crate::error::{ProviderError, ProviderResult};
use crate::http::fetch_json;
use crate::normalize::{parse_date, parse_timestamp};

/// Google Calendar API client bound to one access token.
#[derive(Debug)]
pub(crate) struct GoogleCalendarClient<'a> {
    auth: AuthorizedClient,
    api_base: &'a str,
}

impl<'a> GoogleCalendarClient<'a> {
    pub(crate) fn new(auth: AuthorizedClient, api_base: &'a str) -> Self {
        Self { auth, api_base }
    }

    /// Lists expanded, non-deleted events of `calendar_id` ordered by start.
    pub(crate) async fn list_events(
        &self,
        calendar_id: &str,
        query: &EventQuery,
    ) -> ProviderResult<Vec<ApiEvent>> {
        let url = format!(
            "{}/calendars/{}/events",
            self.api_base.trim_end_matches('/'),
            urlencoding::encode(calendar_id)
        );

        let request = self.auth.get(&url).query(&[
            ("showDeleted", "false".to_string()),
            ("singleEvents", "true".to_string()),
            ("timeMin", query.start.to_rfc3339()),
            ("maxResults", query.limit.to_string()),
            ("orderBy", "startTime".to_string()),
        ]);

        let response: EventListResponse = fetch_json(request).await?;
        debug!(
            calendar_id,
            count = response.items.len(),
            "fetched Google events"
        );
        Ok(response.items)
    }
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
}

/// A single event from the Google Calendar API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ApiEvent {
    id: Option<String>,
    summary: Option<String>,
    status: Option<String>,
    #[serde(default)]
    start: ApiEventTime,
    #[serde(default)]
    end: ApiEventTime,
}

/// Event time from the API: `date` for all-day events, `dateTime` otherwise.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date: Option<String>,
    date_time: Option<String>,
}

impl ApiEvent {
    /// Maps the event; cancelled events yield `Ok(None)`.
    pub(crate) fn into_display_event(self) -> ProviderResult<Option<DisplayEvent>> {
        if self.status.as_deref() == Some("cancelled") {
            return Ok(None);
        }

        let id = self.id.as_deref().unwrap_or("<no id>");
        let description = self.summary.clone().unwrap_or_default();

        match (&self.start.date_time, &self.start.date) {
            (Some(start), _) => {
                let end = self.end.date_time.as_deref().ok_or_else(|| {
                    ProviderError::malformed(format!("event {} has a start time but no end time", id))
                })?;
                Ok(Some(DisplayEvent::timed(
                    parse_timestamp(start)?,
                    parse_timestamp(end)?,
                    description,
                )))
            }
            (None, Some(date)) => Ok(Some(DisplayEvent::all_day(parse_date(date)?, description))),
            (None, None) => Err(ProviderError::malformed(format!(
                "event {} has no start",
                id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;

    fn event(json: &str) -> ApiEvent {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn parse_event_list_response() {
        let json = r#"{
            "kind": "calendar#events",
            "items": [
                {
                    "id": "event1",
                    "summary": "Test Meeting",
                    "start": {"dateTime": "2024-03-15T10:00:00Z"},
                    "end": {"dateTime": "2024-03-15T11:00:00Z"},
                    "status": "confirmed"
                }
            ]
        }"#;

        let response: EventListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].summary.as_deref(), Some("Test Meeting"));

        let empty: EventListResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.items.is_empty());
    }

    #[test]
    fn maps_all_day_event() {
        let mapped = event(
            r#"{"id":"a","summary":"Holiday","start":{"date":"2024-03-15"},"end":{"date":"2024-03-16"}}"#,
        )
        .into_display_event()
        .unwrap()
        .unwrap();

        assert!(mapped.is_all_day());
        assert_eq!(mapped.day(), "March 15");
        assert_eq!(mapped.start_time(), None);
        assert_eq!(mapped.start_timestamp().to_rfc3339(), "2024-03-15T00:00:00+00:00");
    }

    #[test]
    fn maps_timed_event_in_source_offset() {
        let mapped = event(
            r#"{"id":"t","summary":"Standup",
                "start":{"dateTime":"2024-03-15T09:00:00-03:00","timeZone":"America/Sao_Paulo"},
                "end":{"dateTime":"2024-03-15T10:30:00-03:00"}}"#,
        )
        .into_display_event()
        .unwrap()
        .unwrap();

        assert!(!mapped.is_all_day());
        assert_eq!(mapped.start_time(), Some("09:00"));
        assert_eq!(mapped.end_time(), Some("10:30"));
        assert_eq!(mapped.description(), "Standup");
    }

    #[test]
    fn skips_cancelled_event() {
        let mapped = event(
            r#"{"id":"c","status":"cancelled","start":{"date":"2024-03-15"},"end":{"date":"2024-03-16"}}"#,
        )
        .into_display_event()
        .unwrap();
        assert!(mapped.is_none());
    }

    #[test]
    fn malformed_times_are_errors() {
        let bad_start = event(
            r#"{"id":"m","start":{"dateTime":"tomorrow"},"end":{"dateTime":"2024-03-15T10:30:00Z"}}"#,
        );
        let err = bad_start.into_display_event().unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::MalformedEventData);

        let no_end = event(r#"{"id":"n","start":{"dateTime":"2024-03-15T09:00:00Z"}}"#);
        assert!(no_end.into_display_event().is_err());

        let no_start = event(r#"{"id":"x","summary":"?"}"#);
        assert!(no_start.into_display_event().is_err());
    }
}
