//! Core types: display events, queries, day grouping, tracing

pub mod event;
pub mod time;
pub mod tracing;

pub use event::{DEFAULT_LIMIT, DisplayEvent, EventQuery, GroupedEvents, group_events_by_day};
pub use time::{clock_label, day_label, start_of_day, start_of_today};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
