//! User token records and their durable storage.
//!
//! Tokens are persisted one record per provider. The JSON layout
//! (`access_token`, `token_type`, `refresh_token`, `expiry`) is the one
//! written by the common OAuth2 client libraries, so an existing
//! `token.json` can be dropped into the token directory as-is.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// An OAuth token set for one provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub access_token: String,

    #[serde(default = "default_token_type")]
    pub token_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// When the access token expires; `None` means it does not expire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl TokenInfo {
    /// Builds a token from an OAuth token endpoint response.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: default_token_type(),
            refresh_token,
            expiry: expires_in_secs.map(|secs| Utc::now() + Duration::seconds(secs)),
        }
    }

    /// Returns true if the access token expires within `window`.
    pub fn expires_within(&self, window: Duration) -> bool {
        match self.expiry {
            Some(expiry) => Utc::now() + window >= expiry,
            None => false,
        }
    }

    /// Returns true if the access token is expired or about to be (60 s skew).
    pub fn is_expired(&self) -> bool {
        self.expires_within(Duration::seconds(60))
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// Applies a refresh response.
    ///
    /// Backends that do not rotate refresh tokens omit them from the
    /// response, in which case the current one is kept.
    pub fn apply_refresh(&mut self, refreshed: TokenInfo) {
        self.access_token = refreshed.access_token;
        self.token_type = refreshed.token_type;
        self.expiry = refreshed.expiry;
        if refreshed.refresh_token.is_some() {
            self.refresh_token = refreshed.refresh_token;
        }
    }
}

/// Durable key-value storage for user tokens, keyed by provider name.
pub trait TokenStore: Send + Sync {
    /// Loads the token for `provider`, `Ok(None)` when none was ever stored.
    fn get(&self, provider: &str) -> ProviderResult<Option<TokenInfo>>;

    /// Stores (replaces) the token for `provider`.
    fn put(&self, provider: &str, token: &TokenInfo) -> ProviderResult<()>;
}

/// File-backed token store: one `<provider>-token.json` per provider.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `~/.local/share/calreader/tokens`, or `./tokens` without a home directory.
    pub fn default_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".local").join("share").join("calreader"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tokens")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the token file for `provider`.
    pub fn path_for(&self, provider: &str) -> PathBuf {
        let file_stem: String = provider
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}-token.json", file_stem))
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, provider: &str) -> ProviderResult<Option<TokenInfo>> {
        let path = self.path_for(provider);
        if !path.exists() {
            debug!(provider, "no token file at {:?}", path);
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|e| {
            ProviderError::storage(format!("failed to read token file {:?}", path)).with_source(e)
        })?;

        let token: TokenInfo = serde_json::from_str(&content).map_err(|e| {
            ProviderError::storage(format!("failed to parse token file {:?}", path)).with_source(e)
        })?;

        info!(provider, "loaded token from {:?}", path);
        Ok(Some(token))
    }

    fn put(&self, provider: &str, token: &TokenInfo) -> ProviderResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            ProviderError::storage(format!("failed to create token directory {:?}", self.dir))
                .with_source(e)
        })?;

        let path = self.path_for(provider);
        let temp_path = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(token)
            .map_err(|e| ProviderError::internal("failed to serialize token").with_source(e))?;

        write_private(&temp_path, content.as_bytes()).map_err(|e| {
            ProviderError::storage(format!("failed to write token file {:?}", temp_path))
                .with_source(e)
        })?;

        fs::rename(&temp_path, &path).map_err(|e| {
            ProviderError::storage(format!("failed to move token file into {:?}", path))
                .with_source(e)
        })?;

        debug!(provider, "saved token to {:?}", path);
        Ok(())
    }
}

/// Writes `content` to a file created owner-only (0600 on Unix).
fn write_private(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    std::os::unix::fs::OpenOptionsExt::mode(&mut options, 0o600);

    let mut file = options.open(path)?;
    // the mode above only applies to newly created files
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(content)?;
    file.sync_all()
}

/// In-memory token store, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<HashMap<String, TokenInfo>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeds a token, as if a previous run had stored it.
    pub fn with_token(self, provider: impl Into<String>, token: TokenInfo) -> Self {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(provider.into(), token);
        self
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, provider: &str) -> ProviderResult<Option<TokenInfo>> {
        Ok(self
            .tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(provider)
            .cloned())
    }

    fn put(&self, provider: &str, token: &TokenInfo) -> ProviderResult<()> {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(provider.to_string(), token.clone());
        Ok(())
    }
}
