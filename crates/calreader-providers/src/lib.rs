//! Calendar backends, their OAuth credentials, and multi-provider aggregation.
//!
//! - [`EventSource`] / [`EventProvider`]: the traits every backend implements
//! - [`credential`]: OAuth code exchange, token persistence and refresh
//! - [`google`], [`outlook`]: the backend adapters
//! - [`ProviderRegistry`]: name-keyed registration and callback routing
//! - [`Delegator`]: concurrent fan-out that tolerates per-provider failures
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐
//! │ Calendar API v3 │    │ Microsoft Graph │
//! └────────┬────────┘    └────────┬────────┘
//!          │                      │
//!          ▼                      ▼
//! ┌─────────────────┐    ┌─────────────────┐
//! │ GoogleProvider  │    │ OutlookProvider │
//! └────────┬────────┘    └────────┬────────┘
//!          │    EventProvider     │
//!          └──────────┬───────────┘
//!                     ▼
//!            ┌──────────────────┐
//!            │ ProviderRegistry │
//!            └────────┬─────────┘
//!                     ▼
//!              ┌─────────────┐
//!              │  Delegator  │ ──► Vec<DisplayEvent>
//!              └─────────────┘
//! ```

pub mod credential;
pub mod delegator;
pub mod error;
pub mod google;
mod http;
pub mod normalize;
pub mod outlook;
pub mod provider;
pub mod registry;

#[cfg(test)]
pub(crate) mod testing;

pub use delegator::Delegator;
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use provider::{AuthState, BoxFuture, EventProvider, EventSource};
pub use registry::ProviderRegistry;
