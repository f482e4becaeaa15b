//! Redirect -> callback -> token exchange, routed through the registry.

mod common;

use std::sync::Arc;

use calreader_core::EventQuery;
use calreader_providers::credential::{AppCredentials, MemoryTokenStore, TokenStore};
use calreader_providers::google::{GoogleConfig, GoogleProvider};
use calreader_providers::outlook::{OutlookConfig, OutlookProvider};
use calreader_providers::{AuthState, Delegator, EventProvider, ProviderRegistry};
use chrono::DateTime;

use common::{Route, StubServer, state_param, token_json};

const OUTLOOK_TOKEN_PATH: &str = "/login/common/oauth2/v2.0/token";
const GOOGLE_TOKEN_PATH: &str = "/google/token";
const CALENDAR_VIEW_PATH: &str = "/v1.0/me/calendarView";

const CALENDAR_VIEW: &str = r#"{
  "value": [
    {"subject": "Quarterly review", "isAllDay": false, "isCancelled": false,
     "start": {"dateTime": "2024-07-01T09:00:00.0000000", "timeZone": "Europe/Paris"},
     "end": {"dateTime": "2024-07-01T10:30:00.0000000", "timeZone": "Europe/Paris"}},
    {"subject": "Offsite", "isAllDay": true, "isCancelled": false,
     "start": {"dateTime": "2024-07-02T00:00:00.0000000", "timeZone": "Europe/Paris"},
     "end": {"dateTime": "2024-07-03T00:00:00.0000000", "timeZone": "Europe/Paris"}},
    {"subject": "Cancelled", "isAllDay": false, "isCancelled": true,
     "start": {"dateTime": "2024-07-02T09:00:00.0000000", "timeZone": "Europe/Paris"},
     "end": {"dateTime": "2024-07-02T10:00:00.0000000", "timeZone": "Europe/Paris"}}
  ]
}"#;

struct Setup {
    server: StubServer,
    store: Arc<MemoryTokenStore>,
    registry: Arc<ProviderRegistry>,
}

async fn setup() -> Setup {
    let server = StubServer::start(vec![
        Route::post(OUTLOOK_TOKEN_PATH, token_json("outlook-access", Some("outlook-refresh"))),
        Route::post(GOOGLE_TOKEN_PATH, r#"{"error":"unexpected"}"#).with_status(500),
        Route::get(CALENDAR_VIEW_PATH, CALENDAR_VIEW),
    ])
    .await;
    let store = Arc::new(MemoryTokenStore::new());

    let google = GoogleProvider::new(
        GoogleConfig::new(AppCredentials::new("google-client", "google-secret")).with_base_urls(
            server.url("/google/calendar/v3"),
            server.url("/google/auth"),
            server.url(GOOGLE_TOKEN_PATH),
        ),
        store.clone(),
    )
    .unwrap();
    let outlook = OutlookProvider::new(
        OutlookConfig::new(AppCredentials::new("outlook-app", ""))
            .with_time_zone("Europe/Paris")
            .with_base_urls(server.url("/v1.0"), server.url("/login")),
        store.clone(),
    )
    .unwrap();

    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(google)).unwrap();
    registry.register(Arc::new(outlook)).unwrap();

    Setup {
        server,
        store,
        registry: Arc::new(registry),
    }
}

#[tokio::test]
async fn outlook_callback_never_reaches_google() {
    let Setup {
        server,
        store,
        registry,
    } = setup().await;

    // both flows pending at once
    let google_url = registry.redirect_url("Google", "kindle.local:8080").unwrap();
    let outlook_url = registry.redirect_url("Outlook", "kindle.local:8080").unwrap();
    assert!(google_url.contains("/google/auth?"));
    assert!(outlook_url.contains("/login/common/oauth2/v2.0/authorize?"));

    let state = state_param(&outlook_url);
    assert!(state.starts_with("Outlook:"));

    assert!(registry.handle_authorization_callback(&state, "code-123").await);

    assert!(server.requests_to(GOOGLE_TOKEN_PATH).is_empty());
    let exchange = &server.requests_to(OUTLOOK_TOKEN_PATH)[0];
    let form = exchange.form();
    assert_eq!(form["grant_type"], "authorization_code");
    assert_eq!(form["code"], "code-123");
    assert_eq!(form["client_id"], "outlook-app");
    assert_eq!(form["redirect_uri"], "http://kindle.local:8080/setup");
    assert_eq!(form["scope"], "offline_access Calendars.Read");
    assert!(!form["code_verifier"].is_empty());
    // public client: no secret configured, none sent
    assert!(!form.contains_key("client_secret"));

    let outlook_token = store.get("Outlook").unwrap().unwrap();
    assert_eq!(outlook_token.access_token, "outlook-access");
    assert_eq!(outlook_token.refresh_token.as_deref(), Some("outlook-refresh"));
    assert!(store.get("Google").unwrap().is_none());

    let states = registry.auth_states().await;
    assert_eq!(
        states,
        vec![
            ("Google".to_string(), AuthState::AuthorizationPending),
            ("Outlook".to_string(), AuthState::Authorized),
        ]
    );
}

#[tokio::test]
async fn state_is_single_use() {
    let Setup {
        server, registry, ..
    } = setup().await;

    let state = state_param(&registry.redirect_url("Outlook", "localhost").unwrap());
    assert!(registry.handle_authorization_callback(&state, "first").await);
    assert!(!registry.handle_authorization_callback(&state, "replay").await);
    assert_eq!(server.requests_to(OUTLOOK_TOKEN_PATH).len(), 1);
}

#[tokio::test]
async fn failed_exchange_leaves_provider_pending() {
    let Setup {
        server,
        store,
        registry,
    } = setup().await;

    let state = state_param(&registry.redirect_url("Google", "localhost").unwrap());
    assert!(!registry.handle_authorization_callback(&state, "code").await);

    assert_eq!(server.requests_to(GOOGLE_TOKEN_PATH).len(), 1);
    assert!(store.get("Google").unwrap().is_none());
    let google = registry.get("Google").unwrap();
    assert_eq!(google.auth_state().await, AuthState::AuthorizationPending);
}

#[tokio::test]
async fn authorized_outlook_serves_events_while_google_needs_setup() {
    let Setup {
        server, registry, ..
    } = setup().await;

    let state = state_param(&registry.redirect_url("Outlook", "localhost").unwrap());
    assert!(registry.handle_authorization_callback(&state, "code").await);

    let delegator = Delegator::new(registry.clone());
    let query = EventQuery::new(
        DateTime::parse_from_rfc3339("2024-07-01T00:00:00+02:00").unwrap(),
        20,
    );
    let events = delegator.fetch_events_from("Outlook", query).await.unwrap();

    let descriptions: Vec<_> = events.iter().map(|e| e.description()).collect();
    assert_eq!(descriptions, vec!["Quarterly review", "Offsite"]);
    assert_eq!(events[0].start_time(), Some("09:00"));
    assert_eq!(events[0].end_time(), Some("10:30"));
    assert!(events[1].is_all_day());
    assert_eq!(events[1].day(), "July 02");

    let request = &server.requests_to(CALENDAR_VIEW_PATH)[0];
    assert_eq!(request.header("authorization"), Some("Bearer outlook-access"));
    assert_eq!(request.header("prefer"), Some("outlook.timezone=\"Europe/Paris\""));
    assert_eq!(request.query["startDateTime"], "2024-07-01T00:00:00+02:00");
    assert_eq!(request.query["endDateTime"], "2024-07-31T00:00:00+02:00");
    assert_eq!(request.query["$top"], "20");
    assert_eq!(request.query["$orderby"], "start/dateTime");

    // Google has no token; the aggregate still succeeds with Outlook's events
    let all = calreader_providers::EventSource::fetch_events(&delegator, query)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
}
