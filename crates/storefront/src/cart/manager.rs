//! Reactive cart state manager.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::join_all;
use tokio::sync::{Mutex, watch};
use tracing::{error, instrument, warn};

use tangelo_core::{CartMode, CartSnapshot, NewCartItem, PricingRules, ProductId, SyncStatus, UserId};

use crate::notify::{Notification, Notifier};

use super::CartService;

/// Process-wide reactive cart store.
///
/// Owns the in-memory [`CartSnapshot`] and republishes a wholesale
/// replacement over a watch channel after every successful mutation.
/// Persistence belongs to the [`CartService`]; after any write the service
/// is the sole source of truth and the manager re-fetches from it.
///
/// No operation here returns an error: service failures are caught, logged,
/// and surfaced as notifications, leaving the previous snapshot in place.
///
/// Mutations are serialized through an internal async mutex, so overlapping
/// invocations (rapid double-clicks) cannot interleave their reload with a
/// competing mutation. `clear_cart`'s internal removal fan-out still runs
/// concurrently.
pub struct CartManager<S: CartService> {
    service: Arc<S>,
    pricing: PricingRules,
    notifier: Notifier,
    snapshot: watch::Sender<CartSnapshot>,
    sync_status: watch::Sender<SyncStatus>,
    online: AtomicBool,
    updating: AtomicBool,
    mutation: Mutex<()>,
}

impl<S: CartService> CartManager<S> {
    /// Create a manager over a service. The snapshot starts empty; call
    /// [`initialize`](Self::initialize) before use.
    pub fn new(service: S, pricing: PricingRules, notifier: Notifier) -> Self {
        let (snapshot, _) = watch::channel(CartSnapshot::empty());
        let (sync_status, _) = watch::channel(SyncStatus::Idle);

        Self {
            service: Arc::new(service),
            pricing,
            notifier,
            snapshot,
            sync_status,
            online: AtomicBool::new(true),
            updating: AtomicBool::new(false),
            mutation: Mutex::new(()),
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Initialize the service and load the first snapshot.
    ///
    /// Without a user the cart runs in guest mode and the sync status lands
    /// on `Idle`. With a user the service initialization (which performs any
    /// guest-to-authenticated migration) is tracked as `Syncing` and lands
    /// on `Synced` or `Error`; the snapshot load is attempted either way.
    #[instrument(skip(self))]
    pub async fn initialize(&self, user: Option<&UserId>) {
        if user.is_some() {
            self.sync_status.send_replace(SyncStatus::Syncing);
        }

        match self.service.initialize(user).await {
            Ok(()) => {
                let status = if user.is_some() {
                    SyncStatus::Synced
                } else {
                    SyncStatus::Idle
                };
                self.sync_status.send_replace(status);
            }
            Err(e) => {
                error!("Cart service initialization failed: {e}");
                self.sync_status.send_replace(SyncStatus::Error);
                self.notifier.error("We couldn't sync your cart");
            }
        }

        // Best effort: load whatever cart state is available.
        self.reload().await;
    }

    // =========================================================================
    // Mutations (all funnel through "mutate then reload")
    // =========================================================================

    /// Add `quantity` units of a product to the cart.
    ///
    /// Non-positive quantities are ignored without touching the service.
    #[instrument(skip(self, item), fields(product_id = %item.product_id))]
    pub async fn add_item(&self, item: &NewCartItem, quantity: i64) {
        let Ok(quantity) = u32::try_from(quantity) else {
            return;
        };
        if quantity == 0 {
            return;
        }

        let _guard = self.mutation.lock().await;
        self.updating.store(true, Ordering::SeqCst);

        match self
            .service
            .add_item(&item.product_id, quantity, item.unit_price)
            .await
        {
            Ok(()) => {
                self.reload().await;
                self.notifier.success(format!(
                    "Added {} to your {}",
                    item.name,
                    self.mode().cart_label()
                ));
            }
            Err(e) => {
                warn!("Failed to add {} to cart: {e}", item.product_id);
                self.notifier
                    .error(format!("Could not add {} to your cart", item.name));
            }
        }

        self.updating.store(false, Ordering::SeqCst);
    }

    /// Remove a product's line from the cart.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, product_id: &ProductId) {
        let _guard = self.mutation.lock().await;
        self.updating.store(true, Ordering::SeqCst);

        match self.service.remove_item(product_id).await {
            Ok(()) => {
                self.reload().await;
                self.notifier.success("Item removed from cart");
            }
            Err(e) => {
                warn!("Failed to remove {product_id} from cart: {e}");
                self.notifier.error("Could not remove item from cart");
            }
        }

        self.updating.store(false, Ordering::SeqCst);
    }

    /// Set a line's quantity.
    ///
    /// Negative quantities are ignored. A quantity of zero deletes the line
    /// (quantity-zero lines are never stored) without a success
    /// notification; positive quantities update in place and notify.
    #[instrument(skip(self))]
    pub async fn update_quantity(&self, product_id: &ProductId, quantity: i64) {
        let Ok(quantity) = u32::try_from(quantity) else {
            return;
        };

        let _guard = self.mutation.lock().await;
        self.updating.store(true, Ordering::SeqCst);

        let result = if quantity == 0 {
            self.service.remove_item(product_id).await
        } else {
            self.service.update_quantity(product_id, quantity).await
        };

        match result {
            Ok(()) => {
                self.reload().await;
                if quantity > 0 {
                    self.notifier.success("Cart updated");
                }
            }
            Err(e) => {
                warn!("Failed to update quantity for {product_id}: {e}");
                self.notifier.error("Could not update your cart");
            }
        }

        self.updating.store(false, Ordering::SeqCst);
    }

    /// Remove every line from the cart.
    ///
    /// Removals fan out concurrently and all are awaited; a single error
    /// notification reports the whole operation failed if any removal did.
    /// Exactly one reload runs afterwards to reflect whatever state
    /// resulted, including partial clears.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) {
        let _guard = self.mutation.lock().await;

        let lines = self.snapshot.borrow().lines.clone();
        if lines.is_empty() {
            return;
        }

        self.updating.store(true, Ordering::SeqCst);

        let removals = lines
            .iter()
            .map(|line| self.service.remove_item(&line.product_id));
        let results = join_all(removals).await;

        let failures = results.iter().filter(|r| r.is_err()).count();
        if failures > 0 {
            warn!("{failures} of {} cart removals failed", lines.len());
            self.notifier.error("Could not clear your cart completely");
        } else {
            self.notifier.success("Cart cleared");
        }

        self.reload().await;
        self.updating.store(false, Ordering::SeqCst);
    }

    /// Re-fetch the snapshot from the service and republish it.
    ///
    /// Used internally after mutations and externally (e.g., after
    /// reconnecting).
    #[instrument(skip(self))]
    pub async fn refresh_cart(&self) {
        let _guard = self.mutation.lock().await;
        self.reload().await;
    }

    /// Best-effort snapshot reload. On failure the previous (possibly
    /// stale) snapshot stays published.
    async fn reload(&self) {
        match self.service.cart().await {
            Ok(lines) => {
                self.snapshot
                    .send_replace(CartSnapshot::from_lines(lines, &self.pricing));
            }
            Err(e) => {
                warn!("Failed to reload cart snapshot: {e}");
            }
        }
    }

    // =========================================================================
    // Observation
    // =========================================================================

    /// Current snapshot (cloned out of the watch channel).
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot republications.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.snapshot.subscribe()
    }

    /// Subscribe to user-facing notifications.
    #[must_use]
    pub fn notifications(&self) -> tokio::sync::broadcast::Receiver<Notification> {
        self.notifier.subscribe()
    }

    /// Mode of the last service initialization.
    #[must_use]
    pub fn mode(&self) -> CartMode {
        self.service.current_mode()
    }

    /// Status of the most recent initialization attempt.
    #[must_use]
    pub fn sync_status(&self) -> SyncStatus {
        *self.sync_status.borrow()
    }

    /// Subscribe to sync status transitions.
    #[must_use]
    pub fn subscribe_sync_status(&self) -> watch::Receiver<SyncStatus> {
        self.sync_status.subscribe()
    }

    /// Record a connectivity transition. Purely observational: mutation
    /// behavior never branches on this flag.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Last observed connectivity state.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Whether a mutation is currently in flight.
    #[must_use]
    pub fn is_updating(&self) -> bool {
        self.updating.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use rust_decimal::Decimal;
    use tangelo_core::CartLine;

    use crate::cart::CartError;

    /// Mock service that counts calls; add/update/remove always succeed.
    #[derive(Default)]
    struct CountingService {
        calls: AtomicUsize,
        lines: tokio::sync::RwLock<Vec<CartLine>>,
    }

    impl CartService for CountingService {
        fn current_mode(&self) -> CartMode {
            CartMode::Guest
        }

        async fn initialize(&self, _user: Option<&UserId>) -> Result<(), CartError> {
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
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.lines.write().await.push(CartLine {
                product_id: product_id.clone(),
                quantity,
                unit_price,
            });
            Ok(())
        }

        async fn update_quantity(
            &self,
            _product_id: &ProductId,
            _quantity: u32,
        ) -> Result<(), CartError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn remove_item(&self, _product_id: &ProductId) -> Result<(), CartError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn widget() -> NewCartItem {
        NewCartItem {
            product_id: ProductId::new("sku-1"),
            name: "Widget".to_string(),
            unit_price: "10.00".parse().expect("decimal"),
        }
    }

    #[tokio::test]
    async fn test_non_positive_add_never_touches_service() {
        let manager = CartManager::new(
            CountingService::default(),
            PricingRules::default(),
            Notifier::default(),
        );
        manager.initialize(None).await;

        manager.add_item(&widget(), 0).await;
        manager.add_item(&widget(), -1).await;

        assert_eq!(manager.service.calls.load(Ordering::SeqCst), 0);
        assert!(manager.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_negative_update_never_touches_service() {
        let manager = CartManager::new(
            CountingService::default(),
            PricingRules::default(),
            Notifier::default(),
        );
        manager.initialize(None).await;

        manager
            .update_quantity(&ProductId::new("sku-1"), -3)
            .await;

        assert_eq!(manager.service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_snapshot_republished_after_add() {
        let manager = CartManager::new(
            CountingService::default(),
            PricingRules::default(),
            Notifier::default(),
        );
        manager.initialize(None).await;
        let mut rx = manager.subscribe();
        rx.mark_unchanged();

        manager.add_item(&widget(), 2).await;

        rx.changed().await.expect("snapshot republished");
        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.item_count, 2);
    }
}
