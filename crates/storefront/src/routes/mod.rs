//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Health check
//!
//! # Cart (JSON)
//! GET    /cart                      - Current cart snapshot
//! GET    /cart/count                - Cart count badge value
//! POST   /cart/items                - Add item
//! PATCH  /cart/items/{product_id}   - Update line quantity
//! DELETE /cart/items/{product_id}   - Remove line
//! POST   /cart/clear                - Remove every line
//! POST   /cart/refresh              - Re-fetch snapshot from the service
//!
//! # Saved for later
//! GET  /saved                       - Saved items and count
//! POST /saved/toggle                - Save or unsave an item
//! POST /saved/reload                - Re-read the shared storage key
//!
//! # Auth
//! GET  /auth/callback               - OAuth2 redirect endpoint
//! GET  /auth/session                - Decoded (unverified) cookie identity
//! POST /auth/logout                 - Clear the auth cookie
//! ```

pub mod auth;
pub mod cart;
pub mod saved;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/items", post(cart::add))
        .route(
            "/items/{product_id}",
            axum::routing::patch(cart::update).delete(cart::remove),
        )
        .route("/clear", post(cart::clear))
        .route("/refresh", post(cart::refresh))
}

/// Create the saved-for-later routes router.
pub fn saved_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(saved::list))
        .route("/toggle", post(saved::toggle))
        .route("/reload", post(saved::reload))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/callback", get(auth::oauth_callback))
        .route("/session", get(auth::session))
        .route("/logout", post(auth::logout))
}

/// Create the complete application router (state still required).
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/cart", cart_routes())
        .nest("/saved", saved_routes())
        .nest("/auth", auth_routes())
}
