//! Token endpoint and introspection payloads

use serde::{Deserialize, Serialize};

/// OAuth token response from the token endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access token for API requests
    #[serde(default)]
    pub access_token: String,
    /// Token type (usually "Bearer")
    #[serde(default)]
    pub token_type: String,
    /// Refresh token, when the server grants offline access
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Token lifetime in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    /// OIDC ID token (unverified)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    /// Scope actually granted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Result of an RFC 7662 style token introspection call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenIntrospection {
    /// Whether the token is currently active
    pub active: bool,
    #[serde(default)]
    pub sub: String,
    #[serde(default)]
    pub scope: String,
    /// Issued-at, seconds since the Unix epoch
    #[serde(default)]
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch
    #[serde(default)]
    pub exp: i64,
    #[serde(default, rename = "uniqueSecurityName")]
    pub unique_security_name: String,
    #[serde(default, rename = "tokenType")]
    pub token_type: String,
    #[serde(default)]
    pub iss: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub grant_type: String,
}
