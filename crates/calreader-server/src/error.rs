//! Server error types.

use std::io;
use std::path::PathBuf;

use calreader_core::TracingError;
use calreader_providers::{ProviderError, ProviderErrorCode};
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur while bootstrapping or running a command.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML for [`ServiceConfig`](crate::ServiceConfig).
    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Tracing(#[from] TracingError),

    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),

    /// Bad command-line input.
    #[error("invalid argument: {message}")]
    Usage { message: String },

    /// An authorization callback was rejected or the code exchange failed.
    #[error("authorization for {provider} failed; see the log for details")]
    AuthorizationFailed { provider: String },
}

impl ServerError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    /// Returns true for errors that mean the user still has to authorize a provider.
    pub fn needs_setup(&self) -> bool {
        matches!(self, Self::Provider(e) if e.code() == ProviderErrorCode::NotAuthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_authorized_needs_setup() {
        let err = ServerError::from(ProviderError::not_authorized("no token"));
        assert!(err.needs_setup());
        assert!(!ServerError::config("bad").needs_setup());
    }

    #[test]
    fn display_messages() {
        assert_eq!(
            ServerError::usage("limit must be a number").to_string(),
            "invalid argument: limit must be a number"
        );
        let err = ServerError::AuthorizationFailed {
            provider: "Outlook".to_string(),
        };
        assert!(err.to_string().contains("Outlook"));
    }
}
