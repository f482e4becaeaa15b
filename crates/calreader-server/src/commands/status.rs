//! `calreader status`

use calreader_providers::{AuthState, ProviderRegistry};

use crate::bootstrap::build_registry;
use crate::config::ServiceConfig;
use crate::error::ServerResult;

pub async fn run(config: &ServiceConfig) -> ServerResult<()> {
    let registry = build_registry(config)?;
    print!("{}", report(&registry).await);
    Ok(())
}

/// One line per provider, in registration order.
pub async fn report(registry: &ProviderRegistry) -> String {
    let states = registry.auth_states().await;
    if states.is_empty() {
        return "no calendar provider is enabled\n".to_string();
    }

    let width = states.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (name, state) in states {
        let hint = match state {
            AuthState::Authorized => "",
            AuthState::AuthorizationPending | AuthState::Unauthenticated => {
                "  (run `calreader authorize <provider>`)"
            }
        };
        out.push_str(&format!("{:<width$}  {}{}\n", name, state, hint, width = width));
    }
    out
}
