//! Authentication route handlers.
//!
//! The storefront does not issue or verify tokens; it receives one on the
//! OAuth2 redirect, stores it in a cookie, and decodes the payload without
//! verification to associate the session with a user for cart migration
//! and display. Anything security-relevant happens in the identity service.

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, header},
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use tangelo_core::UserId;

use crate::auth::AuthEvent;
use crate::auth::token::{AUTH_COOKIE, decode_unverified, token_from_cookie_header};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::state::AppState;

/// Query parameters of the OAuth2 redirect endpoint.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    /// Bearer token issued by the identity provider.
    pub token: Option<String>,
    /// Flow discriminator; only `oauth2` is handled here.
    #[serde(rename = "type")]
    pub flow: Option<String>,
    /// Error code if authorization failed upstream.
    pub error: Option<String>,
}

/// Build the `Set-Cookie` value storing the auth token.
///
/// One-day expiry, lax same-site, whole-site path.
fn auth_cookie(token: &str) -> String {
    format!("{AUTH_COOKIE}={token}; Max-Age=86400; Path=/; SameSite=Lax")
}

/// Build the `Set-Cookie` value clearing the auth token.
fn clear_auth_cookie() -> String {
    format!("{AUTH_COOKIE}=; Max-Age=0; Path=/; SameSite=Lax")
}

/// Handle the OAuth2 redirect.
///
/// On success stores the token in the auth cookie, broadcasts an
/// authentication-state-changed event carrying the decoded user, and
/// re-initializes the cart for that user (triggering guest cart
/// migration). An undecodable token degrades to "no identifier": the
/// cookie is still set but the cart stays in its current mode.
///
/// # Route
///
/// `GET /auth/callback`
#[instrument(skip(state, query))]
pub async fn oauth_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    // Check for errors reported by the identity provider
    if let Some(error) = query.error {
        warn!("OAuth2 callback error: {error}");
        return Redirect::to("/login?error=oauth").into_response();
    }

    if query.flow.as_deref() != Some("oauth2") {
        warn!("Unsupported callback type: {:?}", query.flow);
        return Redirect::to("/login?error=unsupported_callback").into_response();
    }

    let Some(token) = query.token else {
        warn!("OAuth2 callback missing token");
        return Redirect::to("/login?error=missing_token").into_response();
    };

    // Untrusted decode: identity hint only, never an authorization input.
    match decode_unverified(&token).and_then(|claims| {
        claims
            .user_id()
            .map(|id| (UserId::new(id), claims.email.clone()))
    }) {
        Some((user_id, email)) => {
            info!(user = %user_id, "OAuth2 sign-in");
            set_sentry_user(&user_id, email.as_deref());

            // Re-initialize the cart as this user; the service migrates any
            // guest cart. Failures surface as cart notifications, not here.
            state.cart().initialize(Some(&user_id)).await;

            state.publish_auth_event(AuthEvent::SignedIn { user_id, email });
        }
        None => {
            // Keep the cookie so the backend can still honor the token;
            // locally we degrade to "no identifier available".
            warn!("OAuth2 token payload could not be decoded");
        }
    }

    (
        AppendHeaders([(header::SET_COOKIE, auth_cookie(&token))]),
        Redirect::to("/"),
    )
        .into_response()
}

/// Report the identity decoded from the request's auth cookie.
///
/// Display purposes only; the decode is unverified.
///
/// # Route
///
/// `GET /auth/session`
#[instrument(skip(headers))]
pub async fn session(headers: HeaderMap) -> impl IntoResponse {
    let claims = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(token_from_cookie_header)
        .and_then(|token| decode_unverified(&token));

    match claims {
        Some(claims) => Json(serde_json::json!({
            "authenticated": claims.user_id().is_some(),
            "user_id": claims.user_id(),
            "email": claims.email,
        })),
        None => Json(serde_json::json!({ "authenticated": false })),
    }
}

/// Clear the auth cookie and drop back to a guest cart.
///
/// # Route
///
/// `POST /auth/logout`
#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> Response {
    clear_sentry_user();
    state.cart().initialize(None).await;
    state.publish_auth_event(AuthEvent::SignedOut);

    (
        AppendHeaders([(header::SET_COOKIE, clear_auth_cookie())]),
        Redirect::to("/"),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_cookie_attributes() {
        let cookie = auth_cookie("abc.def.ghi");
        assert!(cookie.starts_with("user-service=abc.def.ghi"));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = clear_auth_cookie();
        assert!(cookie.starts_with("user-service=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
