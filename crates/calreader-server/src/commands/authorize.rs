//! `calreader authorize <PROVIDER>`
//!
//! Prints (and opens) the consent URL, then reads back the URL the browser
//! was redirected to. Nothing listens on the callback host, so the page
//! itself will fail to load; only its address bar matters.

use calreader_providers::ProviderRegistry;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use url::Url;

use super::resolve_provider_name;
use crate::bootstrap::build_registry;
use crate::config::ServiceConfig;
use crate::error::{ServerError, ServerResult};

pub async fn run(
    config: &ServiceConfig,
    provider: &str,
    host: &str,
    open_browser: bool,
) -> ServerResult<()> {
    let registry = build_registry(config)?;
    let provider = resolve_provider_name(&registry, provider);

    let url = registry.redirect_url(&provider, host)?;
    let issued_state = query_param(&url, "state")
        .ok_or_else(|| ServerError::config("authorization URL carries no state"))?;

    println!("Open this URL to authorize {}:", provider);
    println!();
    println!("  {}", url);
    println!();
    if open_browser && let Err(e) = open::that(&url) {
        warn!(error = %e, "could not open a browser");
    }
    println!("Then paste the URL you were redirected to (or just the code):");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let input = lines
        .next_line()
        .await?
        .ok_or_else(|| ServerError::usage("no input"))?;

    complete(&registry, &provider, input.trim(), &issued_state).await
}

/// Routes the pasted redirect through the registry.
pub async fn complete(
    registry: &ProviderRegistry,
    provider: &str,
    input: &str,
    issued_state: &str,
) -> ServerResult<()> {
    let (code, state) = parse_callback(input, issued_state)?;
    if registry.handle_authorization_callback(&state, &code).await {
        info!(provider = %provider, "authorization complete");
        println!("{} authorized.", provider);
        Ok(())
    } else {
        Err(ServerError::AuthorizationFailed {
            provider: provider.to_string(),
        })
    }
}

/// Extracts `(code, state)` from a redirect URL, or pairs a bare code with
/// the state that was issued.
pub fn parse_callback(input: &str, issued_state: &str) -> ServerResult<(String, String)> {
    if input.is_empty() {
        return Err(ServerError::usage("no authorization code given"));
    }
    if !input.contains("://") {
        return Ok((input.to_string(), issued_state.to_string()));
    }

    if let Some(error) = query_param(input, "error") {
        return Err(ServerError::usage(format!("consent was not granted: {}", error)));
    }
    let code = query_param(input, "code")
        .ok_or_else(|| ServerError::usage("redirect URL has no code parameter"))?;
    let state = query_param(input, "state").unwrap_or_else(|| issued_state.to_string());
    Ok((code, state))
}

fn query_param(url: &str, key: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}
