//! Generic OpenID Connect provider built from issuer discovery

use super::non_empty;
use crate::base::{BaseProvider, get_json};
use crate::config::{Endpoints, ProviderConfig};
use crate::context::RequestContext;
use crate::error::{OAuthError, OAuthResult};
use crate::http::{HttpClientConfig, create_http_client};
use crate::identity::OAuthUser;
use crate::provider::{Feature, OAuthProvider};
use crate::token::{TokenIntrospection, TokenResponse};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

const DISCOVERY: &str = "oidc discovery";

/// Subset of the `.well-known/openid-configuration` document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OidcMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    #[serde(default)]
    pub userinfo_endpoint: Option<String>,
    #[serde(default)]
    pub introspection_endpoint: Option<String>,
    #[serde(default)]
    pub jwks_uri: Option<String>,
    #[serde(default)]
    pub scopes_supported: Vec<String>,
    #[serde(default)]
    pub code_challenge_methods_supported: Vec<String>,
}

/// Standard claims read from the userinfo endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct OidcClaims {
    pub sub: String,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

pub struct OidcProvider {
    base: BaseProvider,
    metadata: OidcMetadata,
}

impl OidcProvider {
    pub const TYPE: &'static str = "oidc";

    /// Fetch the issuer's discovery document and bind to its endpoints
    pub async fn discover(ctx: &RequestContext, config: ProviderConfig) -> OAuthResult<Self> {
        let http = create_http_client(HttpClientConfig::default())?;
        Self::discover_with_client(ctx, config, http).await
    }

    pub async fn discover_with_client(
        ctx: &RequestContext,
        config: ProviderConfig,
        http: Client,
    ) -> OAuthResult<Self> {
        let issuer = config
            .issuer
            .as_deref()
            .filter(|issuer| !issuer.is_empty())
            .ok_or(OAuthError::MissingField { field: "issuer" })?;

        let metadata: OidcMetadata =
            get_json(&http, ctx, DISCOVERY, &discovery_url(issuer)).await?;

        info!(
            provider = %config.name,
            issuer = %metadata.issuer,
            "discovered OpenID configuration"
        );
        Self::from_metadata(config, metadata, http)
    }

    /// Bind to already known metadata
    ///
    /// The document's issuer must match the configured one.
    pub fn from_metadata(
        mut config: ProviderConfig,
        metadata: OidcMetadata,
        http: Client,
    ) -> OAuthResult<Self> {
        if let Some(issuer) = config.issuer.as_deref()
            && !issuer.is_empty()
            && issuer.trim_end_matches('/') != metadata.issuer.trim_end_matches('/')
        {
            return Err(OAuthError::invalid_config(format!(
                "issuer mismatch: configured {}, discovered {}",
                issuer, metadata.issuer
            )));
        }

        if config.name.is_empty() {
            config.name = Self::TYPE.to_string();
        }
        config.provider_type = Self::TYPE.to_string();
        config.issuer = Some(metadata.issuer.clone());
        config.endpoints = Endpoints::new(
            metadata.authorization_endpoint.clone(),
            metadata.token_endpoint.clone(),
        );
        if config.scopes.is_empty() {
            config.scopes = vec![
                "openid".to_string(),
                "profile".to_string(),
                "email".to_string(),
            ];
        }

        Ok(Self {
            base: BaseProvider::with_http_client(config, http),
            metadata,
        })
    }

    pub fn metadata(&self) -> &OidcMetadata {
        &self.metadata
    }

    pub fn normalize(claims: OidcClaims) -> OAuthResult<OAuthUser> {
        if claims.sub.is_empty() {
            return Err(OAuthError::invalid_user_info("claims have no sub"));
        }
        let email = non_empty(claims.email).unwrap_or_default();
        let username = non_empty(claims.preferred_username)
            .or_else(|| (!email.is_empty()).then(|| email.clone()))
            .unwrap_or_else(|| claims.sub.clone());
        let nickname = non_empty(claims.name).unwrap_or_else(|| username.clone());

        Ok(OAuthUser::from_id(claims.sub)
            .with_username(username)
            .with_nickname(nickname)
            .with_email(email))
    }
}

pub fn discovery_url(issuer: &str) -> String {
    format!(
        "{}/.well-known/openid-configuration",
        issuer.trim_end_matches('/')
    )
}

#[async_trait]
impl OAuthProvider for OidcProvider {
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
        let endpoint = self
            .metadata
            .userinfo_endpoint
            .as_deref()
            .ok_or(OAuthError::NotImplemented("user info"))?;
        let claims: OidcClaims = self.base.fetch_user_info(ctx, endpoint, access_token).await?;
        Self::normalize(claims)
    }

    async fn introspect_token(
        &self,
        ctx: &RequestContext,
        token: &str,
    ) -> OAuthResult<TokenIntrospection> {
        match self.metadata.introspection_endpoint.as_deref() {
            Some(endpoint) => self.base.introspect(ctx, endpoint, token).await,
            None => Err(OAuthError::NotImplemented("token introspection")),
        }
    }

    fn supports_feature(&self, feature: Feature) -> bool {
        match feature {
            Feature::Pkce => self.base.snapshot().pkce_enabled,
            Feature::IdToken | Feature::RefreshToken | Feature::Nonce => true,
            Feature::UserInfo => self.metadata.userinfo_endpoint.is_some(),
            Feature::TokenIntrospection => self.metadata.introspection_endpoint.is_some(),
        }
    }

    fn validate(&self) -> OAuthResult<()> {
        let config = self.base.snapshot();
        config.validate()?;
        if config.issuer.as_deref().is_none_or(str::is_empty) {
            return Err(OAuthError::MissingField { field: "issuer" });
        }
        Ok(())
    }
}
