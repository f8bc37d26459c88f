//! OAuth configuration types

use super::error::{OAuthError, OAuthResult};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::str::FromStr;

/// How client credentials are presented to the token endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthStyle {
    /// `client_id` and `client_secret` as form parameters
    InParams,
    /// HTTP Basic authentication
    #[default]
    InHeader,
}

/// OAuth 2.0 endpoints of a provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoints {
    /// Authorization endpoint URL
    pub auth_url: String,
    /// Token exchange endpoint URL
    pub token_url: String,
    /// Client authentication style used at the token endpoint
    pub auth_style: AuthStyle,
}

impl Endpoints {
    pub fn new(auth_url: impl Into<String>, token_url: impl Into<String>) -> Self {
        Self {
            auth_url: auth_url.into(),
            token_url: token_url.into(),
            auth_style: AuthStyle::default(),
        }
    }

    pub fn with_auth_style(mut self, auth_style: AuthStyle) -> Self {
        self.auth_style = auth_style;
        self
    }
}

/// PKCE code challenge method
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PkceMethod {
    #[default]
    S256,
    Plain,
}

impl PkceMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S256 => "S256",
            Self::Plain => "plain",
        }
    }
}

impl fmt::Display for PkceMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PkceMethod {
    type Err = OAuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "S256" => Ok(Self::S256),
            "plain" => Ok(Self::Plain),
            other => Err(OAuthError::invalid_config(format!(
                "unsupported PKCE method '{}'",
                other
            ))),
        }
    }
}

/// Configuration of one identity provider
///
/// Treated as immutable once bound to a provider; reconfiguration swaps the
/// whole value.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Registry key (e.g., "github", "my-campus-sso")
    pub name: String,
    /// Protocol family (e.g., "github", "oidc")
    pub provider_type: String,
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: SecretString,
    /// Scopes to request, in provider-defined order
    pub scopes: Vec<String>,
    /// Redirect URI for authorization callback
    pub redirect_url: String,
    /// OIDC issuer URL
    pub issuer: Option<String>,
    /// Base URL used by variants that derive their endpoints
    pub base_url: Option<String>,
    pub pkce_enabled: bool,
    pub pkce_method: PkceMethod,
    /// Create a local account on first login
    pub auto_register: bool,
    pub endpoints: Endpoints,
}

impl ProviderConfig {
    /// Create a new provider configuration with the given credentials
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: impl Into<String>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            name: String::new(),
            provider_type: String::new(),
            client_id: client_id.into(),
            client_secret: SecretString::from(client_secret.into()),
            scopes,
            redirect_url: redirect_url.into(),
            issuer: None,
            base_url: None,
            pkce_enabled: false,
            pkce_method: PkceMethod::default(),
            auto_register: false,
            endpoints: Endpoints::default(),
        }
    }

    pub fn with_identity(mut self, name: impl Into<String>, provider_type: impl Into<String>) -> Self {
        self.name = name.into();
        self.provider_type = provider_type.into();
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_pkce(mut self, method: PkceMethod) -> Self {
        self.pkce_enabled = true;
        self.pkce_method = method;
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_auto_register(mut self, auto_register: bool) -> Self {
        self.auto_register = auto_register;
        self
    }

    /// Get the scopes as a space-separated string
    pub fn scopes_string(&self) -> String {
        self.scopes.join(" ")
    }

    pub(crate) fn client_secret(&self) -> &str {
        self.client_secret.expose_secret()
    }

    /// Check the credentials every authorization-code client needs
    pub fn validate_credentials(&self) -> OAuthResult<()> {
        if self.client_id.is_empty() {
            return Err(OAuthError::MissingField { field: "client_id" });
        }
        if self.client_secret().is_empty() {
            return Err(OAuthError::MissingField {
                field: "client_secret",
            });
        }
        if self.redirect_url.is_empty() {
            return Err(OAuthError::MissingField {
                field: "redirect_url",
            });
        }
        Ok(())
    }

    /// Full validity rule: credentials plus at least one scope
    pub fn validate(&self) -> OAuthResult<()> {
        self.validate_credentials()?;
        if self.scopes.is_empty() {
            return Err(OAuthError::NoScopes);
        }
        Ok(())
    }
}
