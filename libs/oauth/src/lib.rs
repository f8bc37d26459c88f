//! OAuth 2.0 / OIDC login providers for a remote-desktop control plane
//!
//! Route handlers look a provider up by name in a [`ProviderRegistry`], send the
//! user to [`OAuthProvider::auth_url`], exchange the returned code and resolve
//! the access token into a normalized [`OAuthUser`].
//!
//! # Architecture
//!
//! - `config`: provider capability model
//! - `provider`: the provider contract and feature vocabulary
//! - `base`: generic authorization-code engine embedded by every provider
//! - `providers`: GitHub, Google, generic OIDC and Ruijie SourceID
//! - `registry`: concurrency-safe name → provider directory
//! - `settings`: TOML settings that populate a registry
//! - `context`: cancellation and deadlines for outbound calls
//!
//! # Example
//!
//! ```rust,ignore
//! use idgate_oauth::{ProviderRegistry, RequestContext, Settings, PkceChallenge};
//!
//! let registry = ProviderRegistry::new();
//! let ctx = RequestContext::with_timeout(Duration::from_secs(10));
//! Settings::load("idgate.toml")?.build_registry(&registry, &ctx).await?;
//!
//! let provider = registry.get("github").await?;
//! let pkce = PkceChallenge::generate();
//! let url = provider.auth_url(&state, Some(&pkce.verifier), None);
//!
//! // callback:
//! let token = provider.exchange_code(&ctx, &code, Some(&pkce.verifier)).await?;
//! let user = provider.user_info(&ctx, &token.access_token).await?;
//! ```

pub mod base;
pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod identity;
pub mod pkce;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod settings;
pub mod token;

pub use base::BaseProvider;
pub use config::{AuthStyle, Endpoints, PkceMethod, ProviderConfig};
pub use context::RequestContext;
pub use error::{OAuthError, OAuthResult};
pub use identity::OAuthUser;
pub use pkce::PkceChallenge;
pub use provider::{Feature, OAuthProvider};
pub use providers::{GithubProvider, GoogleProvider, OidcProvider, RuijieSidProvider};
pub use registry::{ProviderHandle, ProviderRegistry, default_registry};
pub use settings::Settings;
pub use token::{TokenIntrospection, TokenResponse};
