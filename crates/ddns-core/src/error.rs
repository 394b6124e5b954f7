//! Error types for the DDNS updater
//!
//! Per-domain failures never leave the engine as errors; they are retried,
//! logged, and turned into skip/failure outcomes. Only configuration faults
//! are meant to reach the daemon.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS updater
#[derive(Error, Debug)]
pub enum Error {
    /// IP source-related errors
    #[error("IP source error: {0}")]
    IpSource(String),

    /// Configuration errors (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors reading domain files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport failures and non-2xx responses
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The provider answered but reported `success: false`
    #[error("Provider rejected request ({provider}): {message}")]
    ProviderRejected {
        /// Provider name
        provider: String,
        /// Error message reported by the provider
        message: String,
    },

    /// `update_ip` was called for a domain the store has never seen
    #[error("Unknown domain: {0}")]
    UnknownDomain(String),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Create an IP source error
    pub fn ip_source(msg: impl Into<String>) -> Self {
        Self::IpSource(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a provider rejection error
    pub fn rejected(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderRejected {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an unknown domain error
    pub fn unknown_domain(domain: impl Into<String>) -> Self {
        Self::UnknownDomain(domain.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Whether the error came from a provider that understood the request
    /// and refused it.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::ProviderRejected { .. })
    }
}
