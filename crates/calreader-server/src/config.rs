//! Service configuration.
//!
//! All settings live in a single `config.toml`, by default at
//! `~/.config/calreader/config.toml`:
//!
//! ```toml
//! default_limit = 20
//! callback_path = "/setup"
//!
//! [google]
//! credentials_file = "~/.config/calreader/credentials.json"
//!
//! [outlook]
//! client_id = "00000000-0000-0000-0000-000000000000"
//! time_zone = "Europe/Paris"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use calreader_core::DEFAULT_LIMIT;
use calreader_providers::ProviderResult;
use calreader_providers::credential::{
    AppCredentials, DEFAULT_CALLBACK_PATH, FileTokenStore,
};
use calreader_providers::error::ProviderError;
use calreader_providers::google::GoogleConfig;
use calreader_providers::outlook::OutlookConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ServerError, ServerResult};

/// Environment variable that overrides the config path.
pub const CONFIG_ENV: &str = "CALREADER_CONFIG";

/// Configuration for the calreader service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Events per provider when a query does not ask for a positive limit.
    pub default_limit: i64,

    /// Directory holding one token file per provider.
    pub token_dir: Option<PathBuf>,

    /// Path the OAuth consent pages redirect back to.
    pub callback_path: String,

    /// Timeout for a single HTTP request.
    pub request_timeout_secs: u64,

    /// Upper bound on one provider's fetch inside an aggregate query.
    pub provider_timeout_secs: u64,

    /// Period of the background token-refresh sweep.
    pub refresh_interval_secs: u64,

    /// Tokens expiring within this window are refreshed by the sweep.
    pub refresh_window_secs: u64,

    pub google: Option<GoogleSettings>,

    pub outlook: Option<OutlookSettings>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT as i64,
            token_dir: None,
            callback_path: DEFAULT_CALLBACK_PATH.to_string(),
            request_timeout_secs: 30,
            provider_timeout_secs: 45,
            refresh_interval_secs: 600,
            refresh_window_secs: 900,
            google: None,
            outlook: None,
        }
    }
}

/// Google Calendar settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    pub enabled: bool,

    /// Google Cloud Console credentials download (`installed` / `web` / flat JSON).
    pub credentials_file: Option<PathBuf>,

    /// Inline client ID; takes precedence over `credentials_file`.
    pub client_id: Option<String>,

    pub client_secret: Option<String>,

    pub scopes: Option<Vec<String>>,

    pub calendar_id: Option<String>,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            credentials_file: None,
            client_id: None,
            client_secret: None,
            scopes: None,
            calendar_id: None,
        }
    }
}

/// Outlook (Microsoft Graph) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlookSettings {
    pub enabled: bool,

    /// JSON file with `client_id` (and optionally `client_secret`).
    pub credentials_file: Option<PathBuf>,

    /// Application (client) ID from the app registration.
    pub client_id: Option<String>,

    /// Only needed for confidential clients.
    pub client_secret: Option<String>,

    pub scopes: Option<Vec<String>>,

    /// `common`, `organizations`, `consumers` or a tenant ID.
    pub tenant: Option<String>,

    /// IANA zone event times are reported in. Defaults to `UTC`.
    pub time_zone: Option<String>,

    /// How many days past the query start are searched. Defaults to 30.
    pub horizon_days: Option<u32>,
}

impl Default for OutlookSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            credentials_file: None,
            client_id: None,
            client_secret: None,
            scopes: None,
            tenant: None,
            time_zone: None,
            horizon_days: None,
        }
    }
}

/// Loads app credentials from inline values or a credentials file.
///
/// # Errors
///
/// `AppCredentialMissing` when neither is configured or the file is unusable.
fn load_app_credentials(
    client_id: Option<&String>,
    client_secret: Option<&String>,
    credentials_file: Option<&PathBuf>,
) -> ProviderResult<AppCredentials> {
    let credentials = match (client_id, credentials_file) {
        (Some(id), _) => {
            let credentials =
                AppCredentials::new(id.clone(), client_secret.cloned().unwrap_or_default());
            credentials.validate()?;
            credentials
        }
        (None, Some(path)) => AppCredentials::from_file(expand_home(path))?,
        (None, None) => {
            return Err(ProviderError::app_credential_missing(
                "set client_id or credentials_file",
            ));
        }
    };
    Ok(credentials)
}

impl GoogleSettings {
    /// Builds the provider configuration.
    pub fn to_provider_config(&self, service: &ServiceConfig) -> ProviderResult<GoogleConfig> {
        let credentials = load_app_credentials(
            self.client_id.as_ref(),
            self.client_secret.as_ref(),
            self.credentials_file.as_ref(),
        )
        .map_err(|e| e.with_provider(GoogleConfig::PROVIDER_NAME))?;

        let mut config = GoogleConfig::new(credentials)
            .with_callback_path(&service.callback_path)
            .with_timeout(service.request_timeout());
        if let Some(ref id) = self.calendar_id {
            config = config.with_calendar_id(id);
        }
        if let Some(ref scopes) = self.scopes {
            config = config.with_scopes(scopes.clone());
        }
        Ok(config)
    }
}

impl OutlookSettings {
    /// Builds the provider configuration.
    pub fn to_provider_config(&self, service: &ServiceConfig) -> ProviderResult<OutlookConfig> {
        let credentials = load_app_credentials(
            self.client_id.as_ref(),
            self.client_secret.as_ref(),
            self.credentials_file.as_ref(),
        )
        .map_err(|e| e.with_provider(OutlookConfig::PROVIDER_NAME))?;

        let mut config = OutlookConfig::new(credentials)
            .with_callback_path(&service.callback_path)
            .with_timeout(service.request_timeout());
        if let Some(ref tenant) = self.tenant {
            config = config.with_tenant(tenant);
        }
        if let Some(ref zone) = self.time_zone {
            config = config.with_time_zone(zone);
        }
        if let Some(days) = self.horizon_days {
            config = config.with_horizon_days(days);
        }
        if let Some(ref scopes) = self.scopes {
            config = config.with_scopes(scopes.clone());
        }
        Ok(config)
    }
}

impl ServiceConfig {
    /// Loads the configuration.
    ///
    /// An explicit `path` must exist. Without one, a missing default file
    /// yields the defaults.
    pub fn load(path: Option<&Path>) -> ServerResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::load_from(&path)
                } else {
                    debug!("no config at {:?}, using defaults", path);
                    Ok(Self::default())
                }
            }
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> ServerResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ServerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ServerError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        debug!("loaded config from {:?}", path);
        Ok(config)
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("calreader")
    }

    /// Rejects zero durations and callback paths without a leading slash.
    pub fn validate(&self) -> ServerResult<()> {
        let durations = [
            ("request_timeout_secs", self.request_timeout_secs),
            ("provider_timeout_secs", self.provider_timeout_secs),
            ("refresh_interval_secs", self.refresh_interval_secs),
        ];
        for (key, value) in durations {
            if value == 0 {
                return Err(ServerError::config(format!("{} must be positive", key)));
            }
        }
        if !self.callback_path.starts_with('/') {
            return Err(ServerError::config("callback_path must start with '/'"));
        }
        Ok(())
    }

    pub fn token_dir(&self) -> PathBuf {
        self.token_dir
            .as_deref()
            .map(expand_home)
            .unwrap_or_else(FileTokenStore::default_dir)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn refresh_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(i64::try_from(self.refresh_window_secs).unwrap_or(i64::MAX))
    }

    pub fn google_enabled(&self) -> bool {
        self.google.as_ref().is_some_and(|g| g.enabled)
    }

    pub fn outlook_enabled(&self) -> bool {
        self.outlook.as_ref().is_some_and(|o| o.enabled)
    }
}

/// Expands a leading `~/` to the home directory.
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}
