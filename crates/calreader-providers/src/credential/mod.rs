//! OAuth credential management shared by all providers.
//!
//! - [`app`]: static client credentials (client ID / secret)
//! - [`oauth`]: authorization URL, PKCE, token endpoint calls
//! - [`tokens`]: user token records and the durable [`TokenStore`]
//! - [`manager`]: the per-provider [`CredentialManager`]

pub mod app;
pub mod manager;
pub mod oauth;
pub mod tokens;

pub use app::AppCredentials;
pub use manager::{AuthorizedClient, CredentialManager};
pub use oauth::{DEFAULT_CALLBACK_PATH, OAuthClient, OAuthConfig, PkceFlow, provider_from_state};
pub use tokens::{FileTokenStore, MemoryTokenStore, TokenInfo, TokenStore};
