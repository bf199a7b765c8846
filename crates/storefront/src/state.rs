//! Application state shared across handlers.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::auth::AuthEvent;
use crate::cart::{CartManager, HybridCartService, LocalCartStore, RemoteCartStore};
use crate::config::StorefrontConfig;
use crate::notify::Notifier;
use crate::saved::SavedForLaterStore;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources: the cart manager, the saved-items store, and the
/// authentication event channel.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    cart: CartManager<HybridCartService>,
    remote: RemoteCartStore,
    saved: SavedForLaterStore,
    auth_events: broadcast::Sender<AuthEvent>,
}

impl AppState {
    /// Create a new application state from configuration.
    ///
    /// The cart starts uninitialized; `main` initializes it (guest mode)
    /// before serving traffic.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let local = LocalCartStore::new(&config.data_dir);
        let remote = RemoteCartStore::new(&config.cart_api);
        let service = HybridCartService::new(local, remote.clone());
        let cart = CartManager::new(service, config.pricing, Notifier::default());
        let saved = SavedForLaterStore::new(&config.data_dir);
        let (auth_events, _) = broadcast::channel(16);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                cart,
                remote,
                saved,
                auth_events,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the cart state manager.
    #[must_use]
    pub fn cart(&self) -> &CartManager<HybridCartService> {
        &self.inner.cart
    }

    /// Get a handle to the remote cart API client (connectivity probe).
    #[must_use]
    pub fn remote(&self) -> &RemoteCartStore {
        &self.inner.remote
    }

    /// Get a reference to the saved-for-later store.
    #[must_use]
    pub fn saved(&self) -> &SavedForLaterStore {
        &self.inner.saved
    }

    /// Broadcast an authentication-state-changed event.
    pub fn publish_auth_event(&self, event: AuthEvent) {
        // A send error only means there are no subscribers right now.
        let _ = self.inner.auth_events.send(event);
    }

    /// Subscribe to authentication-state-changed events.
    #[must_use]
    pub fn subscribe_auth_events(&self) -> broadcast::Receiver<AuthEvent> {
        self.inner.auth_events.subscribe()
    }
}
