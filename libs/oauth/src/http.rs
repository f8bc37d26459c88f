//! HTTP client construction shared by every provider call

use crate::error::{OAuthError, OAuthResult};
use reqwest::Client;
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = concat!("idgate-oauth/", env!("CARGO_PKG_VERSION"));

/// Settings for the HTTP client shared by one provider's calls
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Hard ceiling per request, independent of any caller deadline
    pub timeout: Option<Duration>,
    pub connect_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            connect_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

pub fn create_http_client(config: HttpClientConfig) -> OAuthResult<Client> {
    let mut builder = Client::builder()
        .use_rustls_tls()
        .user_agent(config.user_agent)
        .connect_timeout(config.connect_timeout);

    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }

    builder
        .build()
        .map_err(|e| OAuthError::transport("http client setup", e))
}
