//! Google OAuth/OIDC provider implementation

use super::non_empty;
use crate::base::BaseProvider;
use crate::config::{AuthStyle, Endpoints, ProviderConfig};
use crate::context::RequestContext;
use crate::error::{OAuthError, OAuthResult};
use crate::http::{HttpClientConfig, create_http_client};
use crate::identity::OAuthUser;
use crate::provider::{Feature, OAuthProvider};
use crate::token::TokenResponse;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;

/// Google OAuth/OIDC provider
pub struct GoogleProvider {
    base: BaseProvider,
    userinfo_url: String,
}

/// OpenID userinfo claims returned by Google
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUser {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl GoogleProvider {
    pub const TYPE: &'static str = "google";
    pub const ISSUER: &'static str = "https://accounts.google.com";

    const AUTH_URL: &'static str = "https://accounts.google.com/o/oauth2/auth";
    const TOKEN_URL: &'static str = "https://oauth2.googleapis.com/token";
    const USERINFO_URL: &'static str = "https://openidconnect.googleapis.com/v1/userinfo";
    const DEFAULT_SCOPES: &'static [&'static str] = &["openid", "profile", "email"];

    pub fn new(config: ProviderConfig) -> OAuthResult<Self> {
        let http = create_http_client(HttpClientConfig::default())?;
        Ok(Self::with_http_client(config, http))
    }

    pub fn with_http_client(mut config: ProviderConfig, http: Client) -> Self {
        if config.name.is_empty() {
            config.name = Self::TYPE.to_string();
        }
        config.provider_type = Self::TYPE.to_string();
        config.issuer = Some(Self::ISSUER.to_string());
        config.endpoints =
            Endpoints::new(Self::AUTH_URL, Self::TOKEN_URL).with_auth_style(AuthStyle::InParams);
        if config.scopes.is_empty() {
            config.scopes = Self::DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect();
        }

        Self {
            base: BaseProvider::with_http_client(config, http),
            userinfo_url: Self::USERINFO_URL.to_string(),
        }
    }

    /// Override the userinfo endpoint (proxies, test doubles)
    pub fn with_userinfo_url(mut self, url: impl Into<String>) -> Self {
        self.userinfo_url = url.into();
        self
    }

    /// Email doubles as the username; `sub` is the stable key
    pub fn normalize(user: GoogleUser) -> OAuthResult<OAuthUser> {
        if user.sub.is_empty() {
            return Err(OAuthError::invalid_user_info("userinfo response has no sub"));
        }
        let email = non_empty(user.email).unwrap_or_default();
        let username = if email.is_empty() {
            user.sub.clone()
        } else {
            email.clone()
        };
        let nickname = non_empty(user.name).unwrap_or_else(|| username.clone());

        Ok(OAuthUser::from_id(user.sub)
            .with_username(username)
            .with_nickname(nickname)
            .with_email(email))
    }
}

#[async_trait]
impl OAuthProvider for GoogleProvider {
    fn name(&self) -> String {
        self.base.snapshot().name.clone()
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
        let user: GoogleUser = self
            .base
            .fetch_user_info(ctx, &self.userinfo_url, access_token)
            .await?;
        Self::normalize(user)
    }

    fn supports_feature(&self, feature: Feature) -> bool {
        match feature {
            Feature::Pkce => self.base.snapshot().pkce_enabled,
            Feature::IdToken | Feature::RefreshToken | Feature::Nonce | Feature::UserInfo => true,
            Feature::TokenIntrospection => false,
        }
    }

    fn validate(&self) -> OAuthResult<()> {
        self.base.snapshot().validate()
    }
}
