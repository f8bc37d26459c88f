//! Normalized identity produced by every provider

use serde::{Deserialize, Serialize};

/// Canonical user identity returned after a successful login
///
/// `uuid` is the stable external identifier used as the account-linking key.
/// `email` may be empty when the provider exposes none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthUser {
    pub uuid: String,
    pub username: String,
    pub nickname: String,
    #[serde(default)]
    pub email: String,
}

impl OAuthUser {
    /// Create an identity whose username and nickname default to the identifier
    pub fn from_id(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            uuid: id.clone(),
            username: id.clone(),
            nickname: id,
            email: String::new(),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = nickname.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn has_email(&self) -> bool {
        !self.email.is_empty()
    }
}
