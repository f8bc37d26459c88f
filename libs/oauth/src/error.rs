//! OAuth error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while configuring, registering or driving a provider
#[derive(Error, Debug)]
pub enum OAuthError {
    /// A required configuration field is empty
    #[error("{field} is required")]
    MissingField { field: &'static str },

    /// No scope configured
    #[error("at least one scope is required")]
    NoScopes,

    /// Configuration is present but unusable
    #[error("Invalid provider configuration: {0}")]
    InvalidConfig(String),

    /// Registry key was empty
    #[error("provider name cannot be empty")]
    EmptyProviderName,

    /// Registry key already taken
    #[error("provider '{0}' is already registered")]
    ProviderAlreadyRegistered(String),

    /// Registry key not present
    #[error("provider '{0}' not found")]
    ProviderNotFound(String),

    /// Provider rejected by its own validation when registering
    #[error("invalid provider config for '{name}': {source}")]
    InvalidProvider {
        name: String,
        #[source]
        source: Box<OAuthError>,
    },

    /// Remote endpoint could not be reached
    #[error("{operation} request failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Remote endpoint answered with an unexpected status
    #[error("{operation} failed: status={status}, body={body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// Remote endpoint answered with a body that does not match its contract
    #[error("failed to decode {operation} response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Token endpoint answered 2xx without an access token
    #[error("server response missing access_token")]
    MissingAccessToken,

    /// User info decoded but lacks the fields needed for an identity
    #[error("invalid user info: {0}")]
    InvalidUserInfo(String),

    /// Empty access token handed to a user info or introspection call
    #[error("invalid token")]
    InvalidToken,

    /// Optional capability not offered by this provider
    #[error("{0} not implemented for this provider")]
    NotImplemented(&'static str),

    /// Caller cancelled the in-flight call
    #[error("{operation} cancelled")]
    Cancelled { operation: &'static str },

    /// Caller deadline elapsed before the call completed
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// File I/O error
    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML deserialization error
    #[error("TOML deserialization error: {0}")]
    TomlDeError(#[from] toml::de::Error),
}

impl OAuthError {
    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a provider not found error
    pub fn provider_not_found(provider: impl Into<String>) -> Self {
        Self::ProviderNotFound(provider.into())
    }

    /// Create an invalid user info error
    pub fn invalid_user_info(msg: impl Into<String>) -> Self {
        Self::InvalidUserInfo(msg.into())
    }

    pub(crate) fn transport(operation: &'static str, source: reqwest::Error) -> Self {
        Self::Transport { operation, source }
    }

    pub(crate) fn decode(operation: &'static str, source: serde_json::Error) -> Self {
        Self::Decode { operation, source }
    }

    /// True for registry lookups that missed
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ProviderNotFound(_))
    }

    /// True when the provider does not offer the requested capability
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, Self::NotImplemented(_))
    }

    /// True for caller-side cancellation or deadline expiry
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. } | Self::Timeout { .. })
    }

    /// HTTP status of a protocol error
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for OAuth operations
pub type OAuthResult<T> = Result<T, OAuthError>;
