//! Event source and provider traits.
//!
//! [`EventSource`] is what callers fetch from: a single backend adapter and
//! the [`Delegator`](crate::Delegator) both implement it, so call sites do
//! not care how many backends sit behind it.
//!
//! [`EventProvider`] adds the authorization lifecycle every backend adapter
//! exposes (redirect URL, code exchange, auth state, background refresh).

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use calreader_core::{DisplayEvent, EventQuery};
use chrono::{DateTime, Duration, FixedOffset};

use crate::error::ProviderResult;

/// A boxed future for async trait methods.
///
/// Boxing keeps the traits object-safe so providers can be stored as
/// `Arc<dyn EventProvider>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Something that yields display-ready events for a query.
pub trait EventSource: Send + Sync {
    /// Fetches up to `query.limit` events starting at or after `query.start`.
    ///
    /// # Errors
    ///
    /// `NotAuthorized` when no usable user token exists, `FetchFailed` when
    /// the backend could not be reached or answered with an error.
    fn fetch_events(&self, query: EventQuery) -> BoxFuture<'_, ProviderResult<Vec<DisplayEvent>>>;

    /// Fetches events starting at `start`; a `limit` of zero or less means the default.
    fn events_starting_at(
        &self,
        start: DateTime<FixedOffset>,
        limit: i64,
    ) -> BoxFuture<'_, ProviderResult<Vec<DisplayEvent>>> {
        self.fetch_events(EventQuery::new(start, limit))
    }

    /// Fetches events starting at local midnight of the current day.
    fn events_starting_today(&self, limit: i64) -> BoxFuture<'_, ProviderResult<Vec<DisplayEvent>>> {
        self.fetch_events(EventQuery::starting_today(limit))
    }
}

/// Authorization state of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// No usable token and no authorization in progress.
    Unauthenticated,
    /// A redirect URL was issued and the callback has not arrived yet.
    AuthorizationPending,
    /// A token is available (possibly needing a transparent refresh).
    Authorized,
}

impl AuthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::AuthorizationPending => "authorization_pending",
            Self::Authorized => "authorized",
        }
    }
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A calendar backend adapter with its own OAuth credential.
pub trait EventProvider: EventSource {
    /// Registration name, also used as the token-store key (e.g. "Google").
    fn name(&self) -> &str;

    /// Starts an authorization flow and returns the URL the user must visit.
    ///
    /// The backend redirects to `http://<callback_host><callback_path>`.
    fn redirect_url(&self, callback_host: &str) -> String;

    /// Completes the authorization flow started by [`redirect_url`](Self::redirect_url).
    ///
    /// Returns `false` (and logs why) when the exchange fails for any reason;
    /// a failed exchange leaves existing credentials untouched.
    fn exchange_code<'a>(&'a self, code: &'a str, state: &'a str) -> BoxFuture<'a, bool>;

    /// Current authorization state.
    fn auth_state(&self) -> BoxFuture<'_, AuthState>;

    /// Refreshes the user token if it expires within `window`.
    ///
    /// Returns `Ok(true)` when a refresh happened.
    fn refresh_auth(&self, window: Duration) -> BoxFuture<'_, ProviderResult<bool>>;
}
