//! Static OAuth client credentials (the "app" half of a provider credential).

use std::path::Path;

use serde::Deserialize;

use crate::error::{ProviderError, ProviderResult};

/// The OAuth client ID and secret registered with a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Layout of a Google Cloud Console credentials download.
///
/// Accepts the `installed` and `web` sections as well as a flat
/// `client_id` / `client_secret` object.
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<NestedCredentials>,
    web: Option<NestedCredentials>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NestedCredentials {
    client_id: String,
    #[serde(default)]
    client_secret: String,
}

impl AppCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Loads credentials from a JSON file.
    ///
    /// # Errors
    ///
    /// `AppCredentialMissing` when the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> ProviderResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::app_credential_missing(format!(
                "failed to read credentials file {:?}",
                path
            ))
            .with_source(e)
        })?;
        Self::from_json(&content)
    }

    /// Parses credentials from a JSON string.
    pub fn from_json(json: &str) -> ProviderResult<Self> {
        let file: CredentialsFile = serde_json::from_str(json).map_err(|e| {
            ProviderError::app_credential_missing("failed to parse credentials JSON").with_source(e)
        })?;

        let creds = if let Some(nested) = file.installed.or(file.web) {
            Self::new(nested.client_id, nested.client_secret)
        } else if let Some(client_id) = file.client_id {
            Self::new(client_id, file.client_secret.unwrap_or_default())
        } else {
            return Err(ProviderError::app_credential_missing(
                "credentials must contain an 'installed'/'web' section or a root 'client_id'",
            ));
        };

        creds.validate()?;
        Ok(creds)
    }

    /// Checks that a client ID is present.
    ///
    /// The secret may be empty: public clients (PKCE only) have none.
    pub fn validate(&self) -> ProviderResult<()> {
        if self.client_id.trim().is_empty() {
            return Err(ProviderError::app_credential_missing("client_id is empty"));
        }
        Ok(())
    }
}
