//! PKCE (Proof Key for Code Exchange) implementation
//!
//! RFC 7636 verifier/challenge handling. The caller generates and holds the
//! verifier; providers only derive the challenge from it.

use crate::config::PkceMethod;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};

/// PKCE challenge pair containing the verifier and challenge
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    /// The verifier string (kept by the caller, sent during token exchange)
    pub verifier: String,
    /// The challenge string (sent during authorization request)
    pub challenge: String,
    pub method: PkceMethod,
}

impl PkceChallenge {
    /// Generate a new S256 PKCE challenge pair
    pub fn generate() -> Self {
        Self::from_verifier(random_token(), PkceMethod::S256)
    }

    /// Derive the challenge for an existing verifier
    pub fn from_verifier(verifier: impl Into<String>, method: PkceMethod) -> Self {
        let verifier = verifier.into();
        let challenge = code_challenge(&verifier, method);
        Self {
            verifier,
            challenge,
            method,
        }
    }
}

/// Compute the code challenge for `verifier` under `method`
pub fn code_challenge(verifier: &str, method: PkceMethod) -> String {
    match method {
        PkceMethod::S256 => {
            let mut hasher = Sha256::new();
            hasher.update(verifier.as_bytes());
            URL_SAFE_NO_PAD.encode(hasher.finalize())
        }
        PkceMethod::Plain => verifier.to_string(),
    }
}

/// 32 random bytes, base64url encoded (43 characters)
///
/// Suitable for PKCE verifiers, `state` and `nonce` values.
pub fn random_token() -> String {
    let random_bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(random_bytes)
}
