//! Shared test support for Tangelo Market integration tests.
//!
//! Provides [`MockCartService`], an in-memory cart service with failure
//! injection, so manager behavior can be exercised without a cart API or
//! filesystem.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use rust_decimal::Decimal;
use tokio::sync::RwLock as AsyncRwLock;

use tangelo_core::{CartLine, CartMode, NewCartItem, ProductId, UserId};
use tangelo_storefront::cart::{CartError, CartService};

/// In-memory [`CartService`] with per-operation call counting and failure
/// injection.
///
/// Failure semantics mirror a lost response, not a rejected request: a
/// "failing" removal still applies server-side before the error surfaces.
/// A "failing" add is rejected outright and applies nothing.
#[derive(Default)]
pub struct MockCartService {
    lines: AsyncRwLock<Vec<CartLine>>,
    mode: RwLock<Option<CartMode>>,

    /// Product ids whose removal reports failure after applying.
    pub fail_removes_for: Mutex<HashSet<ProductId>>,
    /// Reject every add without applying it.
    pub fail_adds: AtomicBool,
    /// Fail initialization (e.g., a migration that cannot reach the API).
    pub fail_initialize: AtomicBool,

    pub add_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub remove_calls: AtomicUsize,
}

impl MockCartService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a product so its removal applies but then reports failure.
    pub fn fail_remove_for(&self, product_id: ProductId) {
        if let Ok(mut failing) = self.fail_removes_for.lock() {
            failing.insert(product_id);
        }
    }

    fn io_error(context: &str) -> CartError {
        CartError::Api {
            status: 503,
            message: context.to_string(),
        }
    }
}

impl CartService for MockCartService {
    fn current_mode(&self) -> CartMode {
        self.mode
            .read()
            .ok()
            .and_then(|guard| *guard)
            .unwrap_or(CartMode::Guest)
    }

    async fn initialize(&self, user: Option<&UserId>) -> Result<(), CartError> {
        // Mode is fixed by the identifier's presence, even when the rest of
        // initialization (migration) fails.
        if let Ok(mut guard) = self.mode.write() {
            *guard = Some(if user.is_some() {
                CartMode::Authenticated
            } else {
                CartMode::Guest
            });
        }

        if user.is_some() && self.fail_initialize.load(Ordering::SeqCst) {
            return Err(Self::io_error("initialize failed"));
        }
        Ok(())
    }

    async fn cart(&self) -> Result<Vec<CartLine>, CartError> {
        Ok(self.lines.read().await.clone())
    }

    async fn add_item(
        &self,
        product_id: &ProductId,
        quantity: u32,
        unit_price: Decimal,
    ) -> Result<(), CartError> {
        self.add_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_adds.load(Ordering::SeqCst) {
            return Err(Self::io_error("add rejected"));
        }

        let mut lines = self.lines.write().await;
        if let Some(line) = lines.iter_mut().find(|l| &l.product_id == product_id) {
            line.quantity += quantity;
        } else {
            lines.push(CartLine {
                product_id: product_id.clone(),
                quantity,
                unit_price,
            });
        }
        Ok(())
    }

    async fn update_quantity(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), CartError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        let mut lines = self.lines.write().await;
        if let Some(line) = lines.iter_mut().find(|l| &l.product_id == product_id) {
            line.quantity = quantity;
        }
        Ok(())
    }

    async fn remove_item(&self, product_id: &ProductId) -> Result<(), CartError> {
        self.remove_calls.fetch_add(1, Ordering::SeqCst);

        // Apply first: a failing removal simulates a lost response.
        self.lines
            .write()
            .await
            .retain(|l| &l.product_id != product_id);

        let failing = self
            .fail_removes_for
            .lock()
            .is_ok_and(|set| set.contains(product_id));
        if failing {
            return Err(Self::io_error("remove response lost"));
        }
        Ok(())
    }
}

/// Convenience constructor for cart item inputs.
#[must_use]
pub fn item(id: &str, name: &str, unit_price: &str) -> NewCartItem {
    NewCartItem {
        product_id: ProductId::new(id),
        name: name.to_string(),
        unit_price: unit_price.parse().expect("valid decimal literal"),
    }
}

/// Collect every notification currently buffered on a receiver.
pub fn drain_notifications(
    rx: &mut tokio::sync::broadcast::Receiver<tangelo_storefront::notify::Notification>,
) -> Vec<tangelo_storefront::notify::Notification> {
    use tokio::sync::broadcast::error::TryRecvError;

    let mut drained = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(notification) => drained.push(notification),
            Err(TryRecvError::Lagged(_)) => {}
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    drained
}
