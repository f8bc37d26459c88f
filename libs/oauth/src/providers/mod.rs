//! OAuth provider implementations

mod github;
mod google;
mod oidc;
mod ruijie_sid;

pub use github::{GithubProvider, GithubUser};
pub use google::{GoogleProvider, GoogleUser};
pub use oidc::{OidcClaims, OidcMetadata, OidcProvider, discovery_url};
pub use ruijie_sid::{RuijieSidProvider, RuijieSidUser};

/// Treat missing and empty profile strings alike
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
