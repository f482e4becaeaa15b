//! Google Calendar provider configuration.

use std::time::Duration;

use crate::credential::{AppCredentials, DEFAULT_CALLBACK_PATH, OAuthConfig};

/// Google OAuth endpoints.
const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Base URL for Google Calendar API v3.
const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Configuration for the Google Calendar provider.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// OAuth client registered in the Google Cloud Console.
    pub credentials: AppCredentials,

    /// Calendar to read. Defaults to `"primary"`.
    pub calendar_id: String,

    /// Defaults to `["https://www.googleapis.com/auth/calendar.readonly"]`.
    pub scopes: Vec<String>,

    /// Path the consent page redirects to.
    pub callback_path: String,

    /// Per-request timeout for API and token calls.
    pub timeout: Duration,

    pub api_base: String,
    pub auth_url: String,
    pub token_url: String,
}

impl GoogleConfig {
    /// Registration name and token-store key.
    pub const PROVIDER_NAME: &'static str = "Google";

    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Default OAuth scope for read-only calendar access.
    pub const DEFAULT_SCOPE: &'static str = "https://www.googleapis.com/auth/calendar.readonly";

    pub fn new(credentials: AppCredentials) -> Self {
        Self {
            credentials,
            calendar_id: "primary".to_string(),
            scopes: vec![Self::DEFAULT_SCOPE.to_string()],
            callback_path: DEFAULT_CALLBACK_PATH.to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            api_base: CALENDAR_API_BASE.to_string(),
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
        }
    }

    pub fn with_calendar_id(mut self, id: impl Into<String>) -> Self {
        self.calendar_id = id.into();
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_callback_path(mut self, path: impl Into<String>) -> Self {
        self.callback_path = path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Points API and OAuth calls at another server (tests, proxies).
    pub fn with_base_urls(
        mut self,
        api_base: impl Into<String>,
        auth_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        self.api_base = api_base.into();
        self.auth_url = auth_url.into();
        self.token_url = token_url.into();
        self
    }

    /// OAuth settings; requests offline access so a refresh token is issued.
    pub fn oauth_config(&self) -> OAuthConfig {
        OAuthConfig::new(
            Self::PROVIDER_NAME,
            self.credentials.clone(),
            &self.auth_url,
            &self.token_url,
        )
        .with_scopes(self.scopes.clone())
        .with_auth_param("access_type", "offline")
        .with_auth_param("prompt", "consent")
        .with_callback_path(&self.callback_path)
    }
}
