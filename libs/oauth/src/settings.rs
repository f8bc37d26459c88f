//! Provider settings file
//!
//! ```toml
//! redirect-url = "https://rd.example.com/api/oauth/callback"
//!
//! [github]
//! client-id = "..."
//! client-secret = "..."
//!
//! [[oidc]]
//! name = "corp-sso"
//! issuer = "https://idp.example.com"
//! client-id = "..."
//! client-secret = "..."
//! pkce-enabled = true
//!
//! [ruijie-sid]
//! base-url = "https://sid.example.edu.cn"
//! client-id = "..."
//! client-secret = "..."
//! scopes = ["profile"]
//! ```

use crate::config::{PkceMethod, ProviderConfig};
use crate::context::RequestContext;
use crate::error::{OAuthError, OAuthResult};
use crate::http::{HttpClientConfig, create_http_client};
use crate::providers::{GithubProvider, GoogleProvider, OidcProvider, RuijieSidProvider};
use crate::registry::{ProviderHandle, ProviderRegistry};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    /// Fallback callback URL for providers that do not set their own
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub github: Option<ProviderSettings>,
    #[serde(default)]
    pub google: Option<ProviderSettings>,
    #[serde(default)]
    pub oidc: Vec<ProviderSettings>,
    #[serde(default)]
    pub ruijie_sid: Option<ProviderSettings>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HttpSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: None,
        }
    }
}

/// One provider section
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProviderSettings {
    /// Registry key; required for `[[oidc]]` entries
    #[serde(default)]
    pub name: Option<String>,
    pub client_id: String,
    #[serde(deserialize_with = "deserialize_secret")]
    pub client_secret: SecretString,
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub pkce_enabled: bool,
    #[serde(default)]
    pub pkce_method: Option<String>,
    #[serde(default)]
    pub auto_register: bool,
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> OAuthResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading provider settings");
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> OAuthResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn is_empty(&self) -> bool {
        self.github.is_none()
            && self.google.is_none()
            && self.oidc.is_empty()
            && self.ruijie_sid.is_none()
    }

    pub fn http_client_config(&self) -> HttpClientConfig {
        let mut config = HttpClientConfig {
            timeout: Some(Duration::from_secs(self.http.timeout_secs)),
            ..HttpClientConfig::default()
        };
        if let Some(user_agent) = self.http.user_agent.as_ref() {
            config.user_agent = user_agent.clone();
        }
        config
    }

    /// Construct every configured provider and make `registry` hold exactly those
    ///
    /// The registry mirrors the file: calling this again after an edit reloads
    /// changed sections and drops providers whose section was removed. If any
    /// section fails to build or validate, the registry is left as it was.
    /// OIDC issuers are discovered under `ctx`. Returns the registered names, sorted.
    pub async fn build_registry(
        &self,
        registry: &ProviderRegistry,
        ctx: &RequestContext,
    ) -> OAuthResult<Vec<String>> {
        let providers = self.build_providers(ctx).await?;
        let names = registry.replace_all(providers).await?;

        info!(count = names.len(), "provider registry built from settings");
        Ok(names)
    }

    /// Construct every configured provider without registering it
    ///
    /// All providers share one HTTP client.
    pub async fn build_providers(&self, ctx: &RequestContext) -> OAuthResult<Vec<ProviderHandle>> {
        let http = create_http_client(self.http_client_config())?;
        self.build_providers_with(ctx, &http).await
    }

    async fn build_providers_with(
        &self,
        ctx: &RequestContext,
        http: &Client,
    ) -> OAuthResult<Vec<ProviderHandle>> {
        let mut providers: Vec<ProviderHandle> = Vec::new();

        if let Some(section) = &self.github {
            let config = section.provider_config(GithubProvider::TYPE, self.redirect_url.as_deref())?;
            providers.push(Arc::new(GithubProvider::with_http_client(config, http.clone())));
        }

        if let Some(section) = &self.google {
            let config = section.provider_config(GoogleProvider::TYPE, self.redirect_url.as_deref())?;
            providers.push(Arc::new(GoogleProvider::with_http_client(config, http.clone())));
        }

        for section in &self.oidc {
            let name = section
                .name
                .as_deref()
                .filter(|name| !name.is_empty())
                .ok_or(OAuthError::MissingField { field: "name" })?;
            let config = section.provider_config(name, self.redirect_url.as_deref())?;
            let provider = OidcProvider::discover_with_client(ctx, config, http.clone()).await?;
            providers.push(Arc::new(provider));
        }

        if let Some(section) = &self.ruijie_sid {
            let config =
                section.provider_config(RuijieSidProvider::NAME, self.redirect_url.as_deref())?;
            let base_url = section.base_url.clone().unwrap_or_default();
            providers.push(Arc::new(RuijieSidProvider::with_http_client(
                &base_url,
                config,
                http.clone(),
            )));
        }

        Ok(providers)
    }
}

impl ProviderSettings {
    /// Translate this section into a provider configuration
    ///
    /// `default_name` applies when the section has no `name`.
    pub fn provider_config(
        &self,
        default_name: &str,
        fallback_redirect: Option<&str>,
    ) -> OAuthResult<ProviderConfig> {
        let redirect_url = self
            .redirect_url
            .as_deref()
            .or(fallback_redirect)
            .unwrap_or_default();

        let mut config = ProviderConfig::new(
            self.client_id.clone(),
            self.client_secret.expose_secret(),
            redirect_url,
            self.scopes.clone(),
        )
        .with_auto_register(self.auto_register);

        config.name = self
            .name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| default_name.to_string());

        if self.pkce_enabled {
            let method = self
                .pkce_method
                .as_deref()
                .unwrap_or_default()
                .parse::<PkceMethod>()?;
            config = config.with_pkce(method);
        }
        if let Some(issuer) = &self.issuer {
            config = config.with_issuer(issuer.clone());
        }
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.clone());
        }
        Ok(config)
    }
}
