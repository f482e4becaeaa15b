//! Outlook (Microsoft Graph) provider configuration.

use std::time::Duration;

use chrono_tz::Tz;

use crate::credential::{AppCredentials, DEFAULT_CALLBACK_PATH, OAuthConfig};
use crate::error::{ProviderError, ProviderResult};

/// Microsoft identity platform host.
const LOGIN_BASE: &str = "https://login.microsoftonline.com";

/// Base URL for Microsoft Graph v1.0.
const GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";

/// Configuration for the Outlook provider.
#[derive(Debug, Clone)]
pub struct OutlookConfig {
    /// App registration from the Azure portal.
    pub credentials: AppCredentials,

    /// Directory tenant: `common`, `organizations`, `consumers` or a tenant ID.
    pub tenant: String,

    pub scopes: Vec<String>,

    /// IANA zone Graph reports event times in.
    pub time_zone: String,

    /// How far past the query start `calendarView` looks.
    pub horizon_days: u32,

    pub callback_path: String,

    pub timeout: Duration,

    pub api_base: String,
    pub login_base: String,
}

impl OutlookConfig {
    /// Registration name and token-store key.
    pub const PROVIDER_NAME: &'static str = "Outlook";

    pub const DEFAULT_TENANT: &'static str = "common";

    pub const DEFAULT_HORIZON_DAYS: u32 = 30;

    /// Longest accepted `horizon_days` (about ten years).
    pub const MAX_HORIZON_DAYS: u32 = 3650;

    pub const DEFAULT_SCOPES: [&'static str; 2] = ["offline_access", "Calendars.Read"];

    pub fn new(credentials: AppCredentials) -> Self {
        Self {
            credentials,
            tenant: Self::DEFAULT_TENANT.to_string(),
            scopes: Self::DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            time_zone: "UTC".to_string(),
            horizon_days: Self::DEFAULT_HORIZON_DAYS,
            callback_path: DEFAULT_CALLBACK_PATH.to_string(),
            timeout: Duration::from_secs(30),
            api_base: GRAPH_API_BASE.to_string(),
            login_base: LOGIN_BASE.to_string(),
        }
    }

    pub fn with_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = tenant.into();
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_time_zone(mut self, time_zone: impl Into<String>) -> Self {
        self.time_zone = time_zone.into();
        self
    }

    pub fn with_horizon_days(mut self, days: u32) -> Self {
        self.horizon_days = days;
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

    /// Points Graph and login calls at another server (tests, national clouds).
    pub fn with_base_urls(mut self, api_base: impl Into<String>, login_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self.login_base = login_base.into();
        self
    }

    pub fn authorize_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/authorize",
            self.login_base.trim_end_matches('/'),
            self.tenant
        )
    }

    pub fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.login_base.trim_end_matches('/'),
            self.tenant
        )
    }

    /// Checks client ID, time zone and horizon.
    pub fn validate(&self) -> ProviderResult<()> {
        self.credentials.validate()?;
        self.time_zone.parse::<Tz>().map_err(|_| {
            ProviderError::configuration(format!("unknown time zone {:?}", self.time_zone))
        })?;
        if self.horizon_days == 0 || self.horizon_days > Self::MAX_HORIZON_DAYS {
            return Err(ProviderError::configuration(format!(
                "horizon_days must be between 1 and {}",
                Self::MAX_HORIZON_DAYS
            )));
        }
        Ok(())
    }

    /// OAuth settings; the v2.0 token endpoint wants `scope` on every request.
    pub fn oauth_config(&self) -> OAuthConfig {
        OAuthConfig::new(
            Self::PROVIDER_NAME,
            self.credentials.clone(),
            self.authorize_url(),
            self.token_url(),
        )
        .with_scopes(self.scopes.clone())
        .with_scope_in_token_request(true)
        .with_auth_param("response_mode", "query")
        .with_callback_path(&self.callback_path)
    }
}
