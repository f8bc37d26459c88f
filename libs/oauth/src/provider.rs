//! OAuth provider trait and feature vocabulary

use crate::config::{PkceMethod, ProviderConfig};
use crate::context::RequestContext;
use crate::error::{OAuthError, OAuthResult};
use crate::identity::OAuthUser;
use crate::token::{TokenIntrospection, TokenResponse};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Optional capabilities a caller may query before choosing flow steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Pkce,
    IdToken,
    RefreshToken,
    Nonce,
    UserInfo,
    TokenIntrospection,
}

impl Feature {
    pub const ALL: [Feature; 6] = [
        Feature::Pkce,
        Feature::IdToken,
        Feature::RefreshToken,
        Feature::Nonce,
        Feature::UserInfo,
        Feature::TokenIntrospection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pkce => "pkce",
            Self::IdToken => "id_token",
            Self::RefreshToken => "refresh_token",
            Self::Nonce => "nonce",
            Self::UserInfo => "userinfo",
            Self::TokenIntrospection => "token_introspection",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = OAuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|feature| feature.as_str() == s)
            .ok_or_else(|| OAuthError::invalid_config(format!("unknown feature '{}'", s)))
    }
}

/// Uniform interface over every identity source
///
/// Route handlers and the registry only ever see this trait. Flow operations
/// never mutate the provider and may be called concurrently.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// Registry key (e.g., "github", "my-campus-sso")
    fn name(&self) -> String;

    /// Protocol family shared by several registry entries (e.g., "oidc")
    fn provider_type(&self) -> String;

    /// Build the authorization redirect URL
    ///
    /// `state` is the caller's CSRF token. `verifier` only takes effect when
    /// PKCE is enabled; `nonce` is attached when present. Empty strings count
    /// as absent.
    fn auth_url(&self, state: &str, verifier: Option<&str>, nonce: Option<&str>) -> String;

    /// Snapshot of the bound configuration
    fn config(&self) -> Arc<ProviderConfig>;

    /// Exchange an authorization code for tokens
    async fn exchange_code(
        &self,
        ctx: &RequestContext,
        code: &str,
        verifier: Option<&str>,
    ) -> OAuthResult<TokenResponse>;

    /// Fetch and normalize the identity behind `access_token`
    async fn user_info(&self, ctx: &RequestContext, access_token: &str) -> OAuthResult<OAuthUser>;

    /// Ask the provider whether `token` is still active
    ///
    /// Providers without an introspection endpoint fail with
    /// [`OAuthError::NotImplemented`], never with an inactive verdict.
    async fn introspect_token(
        &self,
        _ctx: &RequestContext,
        _token: &str,
    ) -> OAuthResult<TokenIntrospection> {
        Err(OAuthError::NotImplemented("token introspection"))
    }

    fn supports_feature(&self, feature: Feature) -> bool;

    /// Report the first missing required setting
    fn validate(&self) -> OAuthResult<()>;

    /// OIDC issuer URL, if any
    fn issuer(&self) -> Option<String> {
        self.config().issuer.clone()
    }

    fn scopes(&self) -> Vec<String> {
        self.config().scopes.clone()
    }

    fn supports_pkce(&self) -> bool {
        self.config().pkce_enabled
    }

    fn pkce_method(&self) -> PkceMethod {
        self.config().pkce_method
    }
}
