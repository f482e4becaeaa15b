//! Google Calendar provider.
//!
//! Queries `events.list` on one calendar with `singleEvents=true` so
//! recurring events arrive as individual instances, ordered by start time.
//!
//! # Example
//!
//! ```ignore
//! use calreader_providers::credential::{AppCredentials, FileTokenStore};
//! use calreader_providers::google::{GoogleConfig, GoogleProvider};
//!
//! let credentials = AppCredentials::from_file("credentials.json")?;
//! let store = Arc::new(FileTokenStore::new(FileTokenStore::default_dir()));
//! let provider = GoogleProvider::new(GoogleConfig::new(credentials), store)?;
//!
//! let events = provider.events_starting_today(10).await?;
//! ```

mod client;
mod config;
mod provider;

pub use config::GoogleConfig;
pub use provider::GoogleProvider;
