//! Outlook provider (Microsoft Graph).
//!
//! Reads `/me/calendarView`, which expands recurring series into
//! occurrences inside a bounded window, with event times reported in the
//! configured IANA zone via the `Prefer: outlook.timezone` header.

mod client;
mod config;
mod provider;

pub use config::OutlookConfig;
pub use provider::OutlookProvider;
