//! `calreader events`

use std::sync::Arc;

use calreader_core::{DisplayEvent, EventQuery, group_events_by_day, start_of_today};
use calreader_providers::EventSource;
use chrono::{DateTime, FixedOffset};
use tracing::debug;

use super::resolve_provider_name;
use crate::bootstrap::{build_delegator, build_registry};
use crate::config::ServiceConfig;
use crate::error::{ServerError, ServerResult};

pub async fn run(
    config: &ServiceConfig,
    provider: Option<&str>,
    start: Option<&str>,
    limit: Option<i64>,
    grouped: bool,
) -> ServerResult<()> {
    let query = build_query(config, start, limit)?;
    let registry = Arc::new(build_registry(config)?);
    let delegator = build_delegator(config, registry.clone());

    debug!(start = %query.start, limit = query.limit, "querying events");
    let events = match provider {
        Some(name) => {
            let name = resolve_provider_name(&registry, name);
            delegator.fetch_events_from(&name, query).await?
        }
        None => delegator.fetch_events(query).await?,
    };

    println!("{}", render(&events, grouped)?);
    Ok(())
}

/// Builds the query from the command-line values.
///
/// A missing start means local midnight today; a missing or non-positive
/// limit means the configured default.
pub fn build_query(
    config: &ServiceConfig,
    start: Option<&str>,
    limit: Option<i64>,
) -> ServerResult<EventQuery> {
    let start = match start {
        Some(s) => parse_start(s)?,
        None => start_of_today(),
    };
    let limit = limit.filter(|l| *l > 0).unwrap_or(config.default_limit);
    Ok(EventQuery::new(start, limit))
}

fn parse_start(s: &str) -> ServerResult<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s)
        .map_err(|e| ServerError::usage(format!("start {:?} is not an RFC 3339 timestamp: {}", s, e)))
}

/// Pretty JSON, either a flat list or a map keyed by `YYYY-MM-DD`.
pub fn render(events: &[DisplayEvent], grouped: bool) -> ServerResult<String> {
    let json = if grouped {
        serde_json::to_string_pretty(&group_events_by_day(events))?
    } else {
        serde_json::to_string_pretty(events)?
    };
    Ok(json)
}
