//! Generic authorization-code engine shared by all providers
//!
//! [`BaseProvider`] is usable directly for standards-compliant servers and is
//! embedded by the concrete providers, which override only endpoint derivation,
//! user info parsing and feature flags.

use crate::config::{AuthStyle, ProviderConfig};
use crate::context::RequestContext;
use crate::error::{OAuthError, OAuthResult};
use crate::http::{HttpClientConfig, create_http_client};
use crate::identity::OAuthUser;
use crate::pkce::code_challenge;
use crate::provider::{Feature, OAuthProvider};
use crate::token::{TokenIntrospection, TokenResponse};
use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::header::ACCEPT;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

const TOKEN_EXCHANGE: &str = "token exchange";
const USER_INFO: &str = "user info";
const INTROSPECTION: &str = "token introspection";

/// Which statuses count as success for a remote call
#[derive(Clone, Copy)]
enum Expect {
    Ok,
    Success,
}

/// Capability-driven OAuth 2.0 authorization code client
pub struct BaseProvider {
    config: RwLock<Arc<ProviderConfig>>,
    http: Client,
}

impl BaseProvider {
    /// Create a provider with a default HTTP client
    pub fn new(config: ProviderConfig) -> OAuthResult<Self> {
        let http = create_http_client(HttpClientConfig::default())?;
        Ok(Self::with_http_client(config, http))
    }

    /// Create a provider that sends every request through `http`
    pub fn with_http_client(config: ProviderConfig, http: Client) -> Self {
        Self {
            config: RwLock::new(Arc::new(config)),
            http,
        }
    }

    /// Current configuration snapshot
    ///
    /// Each flow operation takes exactly one snapshot, so a concurrent
    /// [`update_config`](Self::update_config) is never observed half-applied.
    pub fn snapshot(&self) -> Arc<ProviderConfig> {
        self.config.read().clone()
    }

    pub fn http_client(&self) -> &Client {
        &self.http
    }

    /// Replace the bound configuration as a whole
    pub fn update_config(&self, config: ProviderConfig) {
        debug!(provider = %config.name, "replacing provider configuration");
        *self.config.write() = Arc::new(config);
    }

    /// Authorization URL for an explicit configuration
    ///
    /// Always requests offline access. Query keys are emitted in sorted order.
    pub fn build_auth_url(
        config: &ProviderConfig,
        state: &str,
        verifier: Option<&str>,
        nonce: Option<&str>,
    ) -> String {
        let mut params: Vec<(&str, String)> = vec![
            ("access_type", "offline".to_string()),
            ("client_id", config.client_id.clone()),
        ];

        if config.pkce_enabled
            && let Some(verifier) = verifier.filter(|v| !v.is_empty())
        {
            params.push((
                "code_challenge",
                code_challenge(verifier, config.pkce_method),
            ));
            params.push((
                "code_challenge_method",
                config.pkce_method.as_str().to_string(),
            ));
        }

        if let Some(nonce) = nonce.filter(|n| !n.is_empty()) {
            params.push(("nonce", nonce.to_string()));
        }
        if !config.redirect_url.is_empty() {
            params.push(("redirect_uri", config.redirect_url.clone()));
        }
        params.push(("response_type", "code".to_string()));
        if !config.scopes.is_empty() {
            params.push(("scope", config.scopes_string()));
        }
        if !state.is_empty() {
            params.push(("state", state.to_string()));
        }

        let query = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        let auth_url = &config.endpoints.auth_url;
        let separator = if auth_url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", auth_url, separator, query)
    }

    /// Exchange an authorization code at the configured token endpoint
    ///
    /// The verifier is forwarded as given; it is never regenerated here.
    pub async fn exchange(
        &self,
        ctx: &RequestContext,
        code: &str,
        verifier: Option<&str>,
    ) -> OAuthResult<TokenResponse> {
        let config = self.snapshot();

        let mut form: Vec<(&str, String)> = vec![
            ("grant_type", "authorization_code".to_string()),
            ("code", code.to_string()),
        ];
        if !config.redirect_url.is_empty() {
            form.push(("redirect_uri", config.redirect_url.clone()));
        }
        if config.pkce_enabled
            && let Some(verifier) = verifier.filter(|v| !v.is_empty())
        {
            form.push(("code_verifier", verifier.to_string()));
        }

        let mut request = self
            .http
            .post(&config.endpoints.token_url)
            .header(ACCEPT, "application/json");

        match config.endpoints.auth_style {
            AuthStyle::InParams => {
                form.push(("client_id", config.client_id.clone()));
                if !config.client_secret().is_empty() {
                    form.push(("client_secret", config.client_secret().to_string()));
                }
            }
            AuthStyle::InHeader => {
                request = request.basic_auth(
                    basic_credential(&config.client_id),
                    Some(basic_credential(config.client_secret())),
                );
            }
        }

        debug!(
            provider = %config.name,
            endpoint = %config.endpoints.token_url,
            "exchanging authorization code"
        );

        let token: TokenResponse = ctx
            .run(TOKEN_EXCHANGE, async move {
                let response = request
                    .form(&form)
                    .send()
                    .await
                    .map_err(|e| OAuthError::transport(TOKEN_EXCHANGE, e))?;
                read_json(TOKEN_EXCHANGE, response, Expect::Success).await
            })
            .await?;

        if token.access_token.is_empty() {
            return Err(OAuthError::MissingAccessToken);
        }
        Ok(token)
    }

    /// Authenticated GET against a user info endpoint, decoded into `T`
    ///
    /// Any status other than 200 is a protocol error carrying the raw body;
    /// a malformed body is a decode error.
    pub async fn fetch_user_info<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        endpoint: &str,
        access_token: &str,
    ) -> OAuthResult<T> {
        if access_token.is_empty() {
            return Err(OAuthError::InvalidToken);
        }

        let request = self
            .http
            .get(endpoint)
            .bearer_auth(access_token)
            .header(ACCEPT, "application/json");

        debug!(endpoint, "fetching user info");

        ctx.run(USER_INFO, async move {
            let response = request
                .send()
                .await
                .map_err(|e| OAuthError::transport(USER_INFO, e))?;
            read_json(USER_INFO, response, Expect::Ok).await
        })
        .await
    }

    /// RFC 7662 introspection with HTTP Basic client credentials
    pub async fn introspect(
        &self,
        ctx: &RequestContext,
        endpoint: &str,
        token: &str,
    ) -> OAuthResult<TokenIntrospection> {
        if token.is_empty() {
            return Err(OAuthError::InvalidToken);
        }

        let config = self.snapshot();
        let request = self
            .http
            .post(endpoint)
            .basic_auth(
                basic_credential(&config.client_id),
                Some(basic_credential(config.client_secret())),
            )
            .header(ACCEPT, "application/json")
            .form(&[("token", token)]);

        debug!(provider = %config.name, endpoint, "introspecting token");

        ctx.run(INTROSPECTION, async move {
            let response = request
                .send()
                .await
                .map_err(|e| OAuthError::transport(INTROSPECTION, e))?;
            read_json(INTROSPECTION, response, Expect::Success).await
        })
        .await
    }
}

/// Form-encode one half of an HTTP Basic client credential (RFC 6749 2.3.1)
fn basic_credential(value: &str) -> String {
    urlencoding::encode(value).replace("%20", "+")
}

/// Unauthenticated GET of a JSON document (discovery, metadata)
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &Client,
    ctx: &RequestContext,
    operation: &'static str,
    endpoint: &str,
) -> OAuthResult<T> {
    let request = http.get(endpoint).header(ACCEPT, "application/json");

    debug!(operation, endpoint, "fetching document");

    ctx.run(operation, async move {
        let response = request
            .send()
            .await
            .map_err(|e| OAuthError::transport(operation, e))?;
        read_json(operation, response, Expect::Ok).await
    })
    .await
}

async fn read_json<T: DeserializeOwned>(
    operation: &'static str,
    response: Response,
    expect: Expect,
) -> OAuthResult<T> {
    let status = response.status();
    let accepted = match expect {
        Expect::Ok => status == StatusCode::OK,
        Expect::Success => status.is_success(),
    };

    if !accepted {
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => format!("<unreadable body: {}>", e),
        };
        warn!(operation, status = status.as_u16(), "remote endpoint rejected request");
        return Err(OAuthError::Status {
            operation,
            status: status.as_u16(),
            body,
        });
    }

    let body = response
        .text()
        .await
        .map_err(|e| OAuthError::transport(operation, e))?;
    serde_json::from_str(&body).map_err(|e| OAuthError::decode(operation, e))
}

#[async_trait]
impl OAuthProvider for BaseProvider {
    fn name(&self) -> String {
        self.snapshot().name.clone()
    }

    fn provider_type(&self) -> String {
        self.snapshot().provider_type.clone()
    }

    fn auth_url(&self, state: &str, verifier: Option<&str>, nonce: Option<&str>) -> String {
        Self::build_auth_url(&self.snapshot(), state, verifier, nonce)
    }

    fn config(&self) -> Arc<ProviderConfig> {
        self.snapshot()
    }

    async fn exchange_code(
        &self,
        ctx: &RequestContext,
        code: &str,
        verifier: Option<&str>,
    ) -> OAuthResult<TokenResponse> {
        self.exchange(ctx, code, verifier).await
    }

    async fn user_info(&self, _ctx: &RequestContext, _access_token: &str) -> OAuthResult<OAuthUser> {
        Err(OAuthError::NotImplemented("user info"))
    }

    fn supports_feature(&self, feature: Feature) -> bool {
        match feature {
            Feature::Pkce => self.snapshot().pkce_enabled,
            Feature::RefreshToken => true,
            _ => false,
        }
    }

    fn validate(&self) -> OAuthResult<()> {
        self.snapshot().validate()
    }
}
