//! Error types for provider and credential operations.
//!
//! Every failure the core can produce is classified by a
//! [`ProviderErrorCode`]; the aggregation layer and the CLI decide what to do
//! from the code alone.

use std::fmt;
use thiserror::Error;

/// The category of a provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// Static OAuth client configuration is absent or unparsable. Fatal at startup.
    AppCredentialMissing,
    /// No usable user token; the user must go through the authorization flow.
    NotAuthorized,
    /// The authorization code could not be exchanged for tokens.
    TokenExchangeFailed,
    /// The backend answered with an error, timed out, or could not be reached.
    FetchFailed,
    /// A single event carried a date or time that does not parse.
    MalformedEventData,
    /// Invalid or inconsistent configuration (duplicate provider, unknown name...).
    ConfigurationError,
    /// The durable token store could not be read or written.
    StorageError,
    /// Unexpected internal state.
    InternalError,
}

impl ProviderErrorCode {
    /// Returns true if retrying the same operation later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::FetchFailed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AppCredentialMissing => "app_credential_missing",
            Self::NotAuthorized => "not_authorized",
            Self::TokenExchangeFailed => "token_exchange_failed",
            Self::FetchFailed => "fetch_failed",
            Self::MalformedEventData => "malformed_event_data",
            Self::ConfigurationError => "configuration_error",
            Self::StorageError => "storage_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error raised while talking to a calendar backend or managing its credentials.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    /// The provider that generated this error (e.g. "Google").
    provider: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            source: None,
        }
    }

    pub fn app_credential_missing(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AppCredentialMissing, message)
    }

    pub fn not_authorized(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NotAuthorized, message)
    }

    pub fn token_exchange(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::TokenExchangeFailed, message)
    }

    pub fn fetch(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::FetchFailed, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::MalformedEventData, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::StorageError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Sets the provider name for this error.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    /// Shorthand for `code() == NotAuthorized`.
    pub fn is_not_authorized(&self) -> bool {
        self.code == ProviderErrorCode::NotAuthorized
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref provider) = self.provider {
            write!(f, "[{}] ", provider)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_fetch_failures_are_retryable() {
        assert!(ProviderErrorCode::FetchFailed.is_retryable());
        assert!(!ProviderErrorCode::NotAuthorized.is_retryable());
        assert!(!ProviderErrorCode::TokenExchangeFailed.is_retryable());
        assert!(!ProviderErrorCode::AppCredentialMissing.is_retryable());
    }

    #[test]
    fn error_code_names() {
        assert_eq!(ProviderErrorCode::NotAuthorized.as_str(), "not_authorized");
        assert_eq!(
            ProviderErrorCode::MalformedEventData.as_str(),
            "malformed_event_data"
        );
    }

    #[test]
    fn display_includes_provider() {
        let err = ProviderError::not_authorized("no token").with_provider("Outlook");
        let display = err.to_string();
        assert_eq!(display, "[Outlook] not_authorized: no token");
        assert!(err.is_not_authorized());
        assert_eq!(err.provider(), Some("Outlook"));
    }

    #[test]
    fn source_is_kept() {
        use std::error::Error;
        let io_err = std::io::Error::other("disk full");
        let err = ProviderError::storage("failed to write token").with_source(io_err);
        assert!(err.source().is_some());
        assert_eq!(err.code(), ProviderErrorCode::StorageError);
    }
}
