//! Cart state core.
//!
//! # Architecture
//!
//! Two layers compose the shopping-cart experience:
//!
//! - [`CartManager`] - the reactive store consumed by the rest of the
//!   application. It publishes immutable cart snapshots over a watch
//!   channel, translates service outcomes into notifications, and funnels
//!   every mutation through "mutate then reload".
//! - [`CartService`] - the persistence boundary. The production
//!   implementation, [`HybridCartService`], branches between a local
//!   file-backed store for guests and a remote HTTP API for authenticated
//!   users; the manager never sees which store is active.
//!
//! Initializing the service with a user identifier migrates any guest cart
//! into the remote store. Synchronization is deliberately re-fetch-after-
//! write: there is no offline queue, operation log, or merge protocol.

mod hybrid;
mod local;
mod manager;
mod remote;

pub use hybrid::HybridCartService;
pub use local::LocalCartStore;
pub use manager::CartManager;
pub use remote::RemoteCartStore;

use std::future::Future;

use rust_decimal::Decimal;
use thiserror::Error;

use tangelo_core::{CartLine, CartMode, ProductId, UserId};

/// Errors that can occur in cart persistence.
#[derive(Debug, Error)]
pub enum CartError {
    /// HTTP request to the remote cart API failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Local cart file could not be read or written.
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Rate limited by the cart API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Cart API rejected the request.
    #[error("Cart API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Authenticated operation attempted before a user was bound.
    #[error("Cart store is not initialized for a user")]
    Uninitialized,
}

/// The persistence contract consumed by [`CartManager`].
///
/// All guest-vs-authenticated branching is internal to implementations;
/// the manager never inspects which backing store is active.
pub trait CartService: Send + Sync {
    /// Mode established by the last `initialize` call.
    fn current_mode(&self) -> CartMode;

    /// Establish (and, when a user is supplied, migrate) the backing store.
    ///
    /// Idempotent across repeated calls with the same identifier.
    fn initialize(
        &self,
        user: Option<&UserId>,
    ) -> impl Future<Output = Result<(), CartError>> + Send;

    /// Current cart lines. An absent cart is an empty list, never an error;
    /// errors are reserved for genuine I/O failure.
    fn cart(&self) -> impl Future<Output = Result<Vec<CartLine>, CartError>> + Send;

    /// Add `quantity` units of a product, merging into an existing line.
    fn add_item(
        &self,
        product_id: &ProductId,
        quantity: u32,
        unit_price: Decimal,
    ) -> impl Future<Output = Result<(), CartError>> + Send;

    /// Set a line's quantity in place (`quantity >= 1`).
    fn update_quantity(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> impl Future<Output = Result<(), CartError>> + Send;

    /// Remove a line. Removing an absent product is a successful no-op.
    fn remove_item(
        &self,
        product_id: &ProductId,
    ) -> impl Future<Output = Result<(), CartError>> + Send;
}

// Callers (notably tests) keep a handle to a service after handing it to
// the manager, so the manager can be built over `Arc<S>`. Coherence requires
// this delegating impl to live beside the trait.
impl<S: CartService> CartService for std::sync::Arc<S> {
    fn current_mode(&self) -> CartMode {
        self.as_ref().current_mode()
    }

    async fn initialize(&self, user: Option<&UserId>) -> Result<(), CartError> {
        self.as_ref().initialize(user).await
    }

    async fn cart(&self) -> Result<Vec<CartLine>, CartError> {
        self.as_ref().cart().await
    }

    async fn add_item(
        &self,
        product_id: &ProductId,
        quantity: u32,
        unit_price: Decimal,
    ) -> Result<(), CartError> {
        self.as_ref().add_item(product_id, quantity, unit_price).await
    }

    async fn update_quantity(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), CartError> {
        self.as_ref().update_quantity(product_id, quantity).await
    }

    async fn remove_item(&self, product_id: &ProductId) -> Result<(), CartError> {
        self.as_ref().remove_item(product_id).await
    }
}

/// A single backing store behind [`HybridCartService`].
///
/// Both the guest file store and the remote API client expose the same
/// operation set so the service can switch between them wholesale.
pub trait CartStore: Send + Sync {
    /// Prepare the store; the remote store binds the user here.
    fn initialize(
        &self,
        user: Option<&UserId>,
    ) -> impl Future<Output = Result<(), CartError>> + Send;

    fn load(&self) -> impl Future<Output = Result<Vec<CartLine>, CartError>> + Send;

    fn add_item(
        &self,
        product_id: &ProductId,
        quantity: u32,
        unit_price: Decimal,
    ) -> impl Future<Output = Result<(), CartError>> + Send;

    fn update_quantity(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> impl Future<Output = Result<(), CartError>> + Send;

    fn remove_item(
        &self,
        product_id: &ProductId,
    ) -> impl Future<Output = Result<(), CartError>> + Send;
}
