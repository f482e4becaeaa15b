//! In-process provider double for unit tests.

use std::sync::Mutex;
use std::time::Duration;

use calreader_core::{DisplayEvent, EventQuery};
use chrono::DateTime;

use crate::error::{ProviderError, ProviderErrorCode, ProviderResult};
use crate::provider::{AuthState, BoxFuture, EventProvider, EventSource};

enum Outcome {
    Events(Vec<DisplayEvent>),
    Fail(ProviderErrorCode),
}

pub(crate) struct FakeProvider {
    name: String,
    outcome: Outcome,
    delay: Option<Duration>,
    pending_state: Mutex<Option<String>>,
    exchanged: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            outcome: Outcome::Events(Vec::new()),
            delay: None,
            pending_state: Mutex::new(None),
            exchanged: Mutex::new(Vec::new()),
        }
    }

    /// Returns `count` timed events described `"<name> <i>"`.
    pub(crate) fn with_events(mut self, count: usize) -> Self {
        let start = DateTime::parse_from_rfc3339("2024-03-15T09:00:00Z").unwrap();
        let events = (0..count)
            .map(|i| {
                let at = start + chrono::Duration::hours(i as i64);
                DisplayEvent::timed(at, at + chrono::Duration::minutes(30), format!("{} {}", self.name, i))
            })
            .collect();
        self.outcome = Outcome::Events(events);
        self
    }

    pub(crate) fn failing(mut self, code: ProviderErrorCode) -> Self {
        self.outcome = Outcome::Fail(code);
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn exchanged_codes(&self) -> Vec<String> {
        self.exchanged.lock().unwrap().clone()
    }
}

impl EventSource for FakeProvider {
    fn fetch_events(&self, query: EventQuery) -> BoxFuture<'_, ProviderResult<Vec<DisplayEvent>>> {
        Box::pin(async move {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            match &self.outcome {
                Outcome::Events(events) => Ok(events.iter().take(query.limit).cloned().collect()),
                Outcome::Fail(code) => {
                    Err(ProviderError::new(*code, "fake failure").with_provider(&self.name))
                }
            }
        })
    }
}

impl EventProvider for FakeProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn redirect_url(&self, _callback_host: &str) -> String {
        let state = format!("{}:{}", self.name, self.exchanged.lock().unwrap().len());
        *self.pending_state.lock().unwrap() = Some(state.clone());
        format!(
            "https://auth.example.com/authorize?state={}",
            urlencoding::encode(&state)
        )
    }

    fn exchange_code<'a>(&'a self, code: &'a str, state: &'a str) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            let matches = self.pending_state.lock().unwrap().as_deref() == Some(state);
            if matches {
                self.exchanged.lock().unwrap().push(code.to_string());
            }
            matches
        })
    }

    fn auth_state(&self) -> BoxFuture<'_, AuthState> {
        Box::pin(async move {
            match self.outcome {
                Outcome::Fail(ProviderErrorCode::NotAuthorized) => AuthState::Unauthenticated,
                _ => AuthState::Authorized,
            }
        })
    }

    fn refresh_auth(&self, _window: chrono::Duration) -> BoxFuture<'_, ProviderResult<bool>> {
        Box::pin(async { Ok(false) })
    }
}
