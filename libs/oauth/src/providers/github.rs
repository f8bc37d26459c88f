//! GitHub OAuth provider implementation

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

/// GitHub (or GitHub Enterprise) OAuth app
pub struct GithubProvider {
    base: BaseProvider,
    api_base: String,
}

/// Subset of `GET /user`
#[derive(Debug, Clone, Deserialize)]
pub struct GithubUser {
    pub id: i64,
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl GithubProvider {
    pub const TYPE: &'static str = "github";

    const WEB_BASE: &'static str = "https://github.com";
    const API_BASE: &'static str = "https://api.github.com";
    const DEFAULT_SCOPES: &'static [&'static str] = &["read:user", "user:email"];

    pub fn new(config: ProviderConfig) -> OAuthResult<Self> {
        let http = create_http_client(HttpClientConfig::default())?;
        Ok(Self::with_http_client(config, http))
    }

    pub fn with_http_client(config: ProviderConfig, http: Client) -> Self {
        Self::bind(config, Self::WEB_BASE, Self::API_BASE, http)
    }

    /// Target a GitHub Enterprise Server installation
    pub fn enterprise(config: ProviderConfig, web_base: &str, api_base: &str, http: Client) -> Self {
        Self::bind(config, web_base, api_base, http)
    }

    fn bind(mut config: ProviderConfig, web_base: &str, api_base: &str, http: Client) -> Self {
        let web_base = web_base.trim_end_matches('/');

        if config.name.is_empty() {
            config.name = Self::TYPE.to_string();
        }
        config.provider_type = Self::TYPE.to_string();
        config.endpoints = Endpoints::new(
            format!("{}/login/oauth/authorize", web_base),
            format!("{}/login/oauth/access_token", web_base),
        )
        .with_auth_style(AuthStyle::InParams);
        if config.scopes.is_empty() {
            config.scopes = Self::DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect();
        }

        Self {
            base: BaseProvider::with_http_client(config, http),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn user_url(&self) -> String {
        format!("{}/user", self.api_base)
    }

    pub fn normalize(user: GithubUser) -> OAuthUser {
        let nickname = non_empty(user.name).unwrap_or_else(|| user.login.clone());
        OAuthUser::from_id(user.id.to_string())
            .with_username(user.login)
            .with_nickname(nickname)
            .with_email(non_empty(user.email).unwrap_or_default())
    }
}

#[async_trait]
impl OAuthProvider for GithubProvider {
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
        let user: GithubUser = self
            .base
            .fetch_user_info(ctx, &self.user_url(), access_token)
            .await?;
        Ok(Self::normalize(user))
    }

    fn supports_feature(&self, feature: Feature) -> bool {
        match feature {
            Feature::Pkce => self.base.snapshot().pkce_enabled,
            Feature::RefreshToken | Feature::UserInfo => true,
            _ => false,
        }
    }

    fn validate(&self) -> OAuthResult<()> {
        self.base.snapshot().validate()
    }
}
