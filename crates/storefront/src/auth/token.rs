//! Untrusted bearer-token decoding.
//!
//! Tokens arrive as `header.payload.signature`. The payload is base64url
//! JSON and is decoded WITHOUT signature verification: the result is an
//! identity hint for display and cart association only and must never gate
//! an authorization decision. Verification happens in the identity service.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use tracing::debug;

/// Cookie carrying the bearer token.
pub const AUTH_COOKIE: &str = "user-service";

/// Legacy cookie names still honored when `user-service` is absent.
pub const AUTH_COOKIE_FALLBACKS: &[&str] = &["jwt", "authToken"];

/// Claims recovered from an unverified token payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenClaims {
    /// Subject (standard claim).
    pub sub: Option<String>,
    /// Issuer-specific user id claim.
    #[serde(alias = "userId", alias = "user_id")]
    pub id: Option<String>,
    pub email: Option<String>,
    /// Expiry as a Unix timestamp; informational only here.
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Best-available user identifier: `id` first, then `sub`.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.id.as_deref().or(self.sub.as_deref())
    }
}

/// Decode the payload segment of a token without verifying anything.
///
/// Returns `None` (never an error) on any malformed input: a missing
/// identity degrades the caller to guest behavior.
#[must_use]
pub fn decode_unverified(token: &str) -> Option<TokenClaims> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        debug!("Token does not have three segments");
        return None;
    };

    let bytes = match URL_SAFE_NO_PAD.decode(payload) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Token payload is not base64url: {e}");
            return None;
        }
    };

    match serde_json::from_slice::<TokenClaims>(&bytes) {
        Ok(claims) => Some(claims),
        Err(e) => {
            debug!("Token payload is not claim JSON: {e}");
            None
        }
    }
}

/// Extract the bearer token from a `Cookie` header value.
///
/// Checks [`AUTH_COOKIE`] first, then the legacy fallbacks, preserving the
/// lookup order the rest of the stack expects.
#[must_use]
pub fn token_from_cookie_header(header: &str) -> Option<String> {
    let find = |name: &str| {
        header.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name && !value.is_empty()).then(|| value.to_string())
        })
    };

    find(AUTH_COOKIE).or_else(|| AUTH_COOKIE_FALLBACKS.iter().find_map(|name| find(name)))
}
