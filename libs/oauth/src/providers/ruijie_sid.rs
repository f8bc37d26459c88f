//! Ruijie SourceID campus SSO provider
//!
//! SourceID speaks a CAS-flavoured OAuth 2.0 dialect: the profile endpoint
//! returns an opaque `id` plus an open attribute bag, client credentials go in
//! the form body, and PKCE is not accepted.

use crate::base::BaseProvider;
use crate::config::{AuthStyle, Endpoints, ProviderConfig};
use crate::context::RequestContext;
use crate::error::{OAuthError, OAuthResult};
use crate::http::{HttpClientConfig, create_http_client};
use crate::identity::OAuthUser;
use crate::provider::{Feature, OAuthProvider};
use crate::token::{TokenIntrospection, TokenResponse};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Ruijie SourceID OAuth provider
pub struct RuijieSidProvider {
    base: BaseProvider,
}

/// Native profile response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuijieSidUser {
    /// Account name or student number
    #[serde(default)]
    pub id: String,
    /// Some deployments send `null` instead of an empty object
    #[serde(default, deserialize_with = "null_as_empty")]
    pub attributes: HashMap<String, Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<HashMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<HashMap<String, Value>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl RuijieSidProvider {
    pub const NAME: &'static str = "ruijie_sid";
    pub const TYPE: &'static str = "ruijie_sid";
    pub const DEFAULT_BASE_URL: &'static str = "https://sourceid.ruishan.cc";

    const AUTHORIZE_PATH: &'static str = "/oauth2.0/authorize";
    const TOKEN_PATH: &'static str = "/oauth2.0/accessToken";
    const PROFILE_PATH: &'static str = "/oauth2.0/profile";
    const INTROSPECT_PATH: &'static str = "/oauth2.0/introspect";

    /// Appended to a phone number when no mailbox is published
    pub const PHONE_EMAIL_DOMAIN: &'static str = "@ruijie.sid";

    /// Display name attribute (姓名)
    const ATTR_NAME: &'static str = "XM";
    /// Mailbox attributes in precedence order (DZYX: 电子邮箱)
    const ATTR_EMAILS: [&'static str; 2] = ["Email", "DZYX"];
    /// Mobile phone attribute
    const ATTR_PHONE: &'static str = "TEL";

    /// Create a provider for the SourceID deployment at `base_url`
    ///
    /// An empty `base_url` selects the public SourceID service.
    pub fn new(base_url: &str, config: ProviderConfig) -> OAuthResult<Self> {
        let http = create_http_client(HttpClientConfig::default())?;
        Ok(Self::with_http_client(base_url, config, http))
    }

    pub fn with_http_client(base_url: &str, config: ProviderConfig, http: Client) -> Self {
        let config = Self::bind(base_url, config);
        Self {
            base: BaseProvider::with_http_client(config, http),
        }
    }

    /// Pin name, type, endpoints and flags to what SourceID supports
    ///
    /// Scopes are kept as configured and must be set explicitly.
    fn bind(base_url: &str, mut config: ProviderConfig) -> ProviderConfig {
        let base_url = normalize_base_url(base_url);

        config.name = Self::NAME.to_string();
        config.provider_type = Self::TYPE.to_string();
        config.endpoints = Self::endpoints(&base_url);
        config.base_url = Some(base_url);
        // SourceID rejects authorization requests carrying a code challenge
        config.pkce_enabled = false;
        config
    }

    fn endpoints(base_url: &str) -> Endpoints {
        Endpoints::new(
            format!("{}{}", base_url, Self::AUTHORIZE_PATH),
            format!("{}{}", base_url, Self::TOKEN_PATH),
        )
        .with_auth_style(AuthStyle::InParams)
    }

    pub fn base_url(&self) -> String {
        self.base
            .snapshot()
            .base_url
            .clone()
            .unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string())
    }

    /// Point the provider at a private SourceID deployment
    pub fn set_base_url(&self, base_url: &str) {
        let config = Self::bind(base_url, self.base.snapshot().as_ref().clone());
        self.base.update_config(config);
    }

    pub fn profile_url(&self) -> String {
        format!("{}{}", self.base_url(), Self::PROFILE_PATH)
    }

    pub fn introspect_url(&self) -> String {
        format!("{}{}", self.base_url(), Self::INTROSPECT_PATH)
    }

    /// Map a profile onto the canonical identity
    ///
    /// The precedence below is relied upon by downstream account matching:
    /// nickname is `XM` when present, else the id; email is `Email`, else
    /// `DZYX`, else `TEL` + [`PHONE_EMAIL_DOMAIN`](Self::PHONE_EMAIL_DOMAIN),
    /// else empty. Only non-empty string attributes count.
    pub fn normalize(user: &RuijieSidUser) -> OAuthResult<OAuthUser> {
        if user.id.is_empty() {
            return Err(OAuthError::invalid_user_info("profile response has no id"));
        }

        let mut identity = OAuthUser::from_id(user.id.as_str());

        if let Some(name) = string_attr(&user.attributes, Self::ATTR_NAME) {
            identity.nickname = name.to_string();
        }

        let email = Self::ATTR_EMAILS
            .iter()
            .find_map(|key| string_attr(&user.attributes, key))
            .map(str::to_string)
            .or_else(|| {
                string_attr(&user.attributes, Self::ATTR_PHONE)
                    .map(|tel| format!("{}{}", tel, Self::PHONE_EMAIL_DOMAIN))
            });
        if let Some(email) = email {
            identity.email = email;
        }

        Ok(identity)
    }
}

fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        RuijieSidProvider::DEFAULT_BASE_URL.to_string()
    } else {
        trimmed.to_string()
    }
}

fn string_attr<'a>(attributes: &'a HashMap<String, Value>, key: &str) -> Option<&'a str> {
    attributes
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

#[async_trait]
impl OAuthProvider for RuijieSidProvider {
    fn name(&self) -> String {
        Self::NAME.to_string()
    }

    fn provider_type(&self) -> String {
        Self::TYPE.to_string()
    }

    fn auth_url(&self, state: &str, verifier: Option<&str>, nonce: Option<&str>) -> String {
        self.base.auth_url(state, verifier, nonce)
    }

    fn config(&self) -> Arc<ProviderConfig> {
        self.base.snapshot()
    }

    async fn exchange_code(
        &self,
        ctx: &RequestContext,
        code: &str,
        verifier: Option<&str>,
    ) -> OAuthResult<TokenResponse> {
        self.base.exchange(ctx, code, verifier).await
    }

    async fn user_info(&self, ctx: &RequestContext, access_token: &str) -> OAuthResult<OAuthUser> {
        if access_token.is_empty() {
            return Err(OAuthError::InvalidToken);
        }

        let profile: RuijieSidUser = self
            .base
            .fetch_user_info(ctx, &self.profile_url(), access_token)
            .await?;
        Self::normalize(&profile)
    }

    async fn introspect_token(
        &self,
        ctx: &RequestContext,
        token: &str,
    ) -> OAuthResult<TokenIntrospection> {
        self.base.introspect(ctx, &self.introspect_url(), token).await
    }

    fn supports_feature(&self, feature: Feature) -> bool {
        // never PKCE, whatever the configuration says
        matches!(feature, Feature::RefreshToken | Feature::TokenIntrospection)
    }

    fn validate(&self) -> OAuthResult<()> {
        let config = self.base.snapshot();
        config.validate()?;
        if config.base_url.as_deref().is_none_or(str::is_empty) {
            return Err(OAuthError::MissingField { field: "base_url" });
        }
        Ok(())
    }
}
