//! Hybrid cart service: local store for guests, remote API for users.

use std::sync::{Mutex, RwLock};

use rust_decimal::Decimal;
use tracing::{info, instrument};

use tangelo_core::{CartLine, CartMode, ProductId, UserId};

use super::{CartError, CartService, CartStore, LocalCartStore, RemoteCartStore};

/// Production [`CartService`] abstracting over two backing stores.
///
/// Guests read and write a local file-backed store; authenticated users go
/// through the remote cart API. Initializing with a user identifier migrates
/// the guest cart's lines into the remote store and clears the local file.
///
/// The remote side is generic so tests can substitute an in-memory store.
pub struct HybridCartService<R: CartStore = RemoteCartStore> {
    local: LocalCartStore,
    remote: R,
    mode: RwLock<CartMode>,
    /// User whose migration already completed; makes `initialize` idempotent.
    migrated_user: Mutex<Option<UserId>>,
}

impl<R: CartStore> HybridCartService<R> {
    /// Create a service over the given backing stores. Starts in guest mode.
    pub fn new(local: LocalCartStore, remote: R) -> Self {
        Self {
            local,
            remote,
            mode: RwLock::new(CartMode::Guest),
            migrated_user: Mutex::new(None),
        }
    }

    fn set_mode(&self, mode: CartMode) {
        if let Ok(mut guard) = self.mode.write() {
            *guard = mode;
        }
    }

    fn migration_done_for(&self, user: &UserId) -> bool {
        self.migrated_user
            .lock()
            .is_ok_and(|guard| guard.as_ref() == Some(user))
    }

    fn mark_migrated(&self, user: &UserId) {
        if let Ok(mut guard) = self.migrated_user.lock() {
            *guard = Some(user.clone());
        }
    }

    /// Replay every guest line into the remote store, then clear the file.
    ///
    /// Sync stays re-fetch-after-write: a failure mid-replay leaves the
    /// remaining lines in the guest file and surfaces the error; the next
    /// initialization retries the remainder.
    async fn migrate_guest_cart(&self, user: &UserId) -> Result<(), CartError> {
        let guest_lines = self.local.load().await?;
        if guest_lines.is_empty() {
            return Ok(());
        }

        for line in &guest_lines {
            self.remote
                .add_item(&line.product_id, line.quantity, line.unit_price)
                .await?;
            self.local.remove_item(&line.product_id).await?;
        }

        info!(user = %user, lines = guest_lines.len(), "Migrated guest cart");
        Ok(())
    }
}

impl<R: CartStore> CartService for HybridCartService<R> {
    fn current_mode(&self) -> CartMode {
        self.mode
            .read()
            .map_or(CartMode::Guest, |guard| *guard)
    }

    #[instrument(skip(self))]
    async fn initialize(&self, user: Option<&UserId>) -> Result<(), CartError> {
        match user {
            None => {
                self.set_mode(CartMode::Guest);
                self.local.initialize(None).await
            }
            Some(user) => {
                // Mode is decided by the identifier's presence alone; a
                // failed migration still leaves the service authenticated.
                self.set_mode(CartMode::Authenticated);
                self.remote.initialize(Some(user)).await?;

                if self.migration_done_for(user) {
                    return Ok(());
                }

                self.local.initialize(None).await?;
                self.migrate_guest_cart(user).await?;
                self.mark_migrated(user);
                Ok(())
            }
        }
    }

    async fn cart(&self) -> Result<Vec<CartLine>, CartError> {
        match self.current_mode() {
            CartMode::Guest => self.local.load().await,
            CartMode::Authenticated => self.remote.load().await,
        }
    }

    async fn add_item(
        &self,
        product_id: &ProductId,
        quantity: u32,
        unit_price: Decimal,
    ) -> Result<(), CartError> {
        match self.current_mode() {
            CartMode::Guest => self.local.add_item(product_id, quantity, unit_price).await,
            CartMode::Authenticated => {
                self.remote.add_item(product_id, quantity, unit_price).await
            }
        }
    }

    async fn update_quantity(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), CartError> {
        match self.current_mode() {
            CartMode::Guest => self.local.update_quantity(product_id, quantity).await,
            CartMode::Authenticated => self.remote.update_quantity(product_id, quantity).await,
        }
    }

    async fn remove_item(&self, product_id: &ProductId) -> Result<(), CartError> {
        match self.current_mode() {
            CartMode::Guest => self.local.remove_item(product_id).await,
            CartMode::Authenticated => self.remote.remove_item(product_id).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::RwLock as AsyncRwLock;

    /// In-memory stand-in for the remote cart API.
    #[derive(Default)]
    struct FakeRemote {
        lines: AsyncRwLock<Vec<CartLine>>,
        fail_adds: AtomicBool,
    }

    impl CartStore for FakeRemote {
        async fn initialize(&self, user: Option<&UserId>) -> Result<(), CartError> {
            user.map(drop).ok_or(CartError::Uninitialized)
        }

        async fn load(&self) -> Result<Vec<CartLine>, CartError> {
            Ok(self.lines.read().await.clone())
        }

        async fn add_item(
            &self,
            product_id: &ProductId,
            quantity: u32,
            unit_price: Decimal,
        ) -> Result<(), CartError> {
            if self.fail_adds.load(Ordering::SeqCst) {
                return Err(CartError::Api {
                    status: 503,
                    message: "unavailable".to_string(),
                });
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
            let mut lines = self.lines.write().await;
            if let Some(line) = lines.iter_mut().find(|l| &l.product_id == product_id) {
                line.quantity = quantity;
            }
            Ok(())
        }

        async fn remove_item(&self, product_id: &ProductId) -> Result<(), CartError> {
            self.lines
                .write()
                .await
                .retain(|l| &l.product_id != product_id);
            Ok(())
        }
    }

    fn dec(s: &str) -> Decimal {
        s.parse().expect("valid decimal literal")
    }

    fn temp_data_dir() -> PathBuf {
        std::env::temp_dir().join(format!("tangelo-hybrid-{}", uuid::Uuid::new_v4()))
    }

    fn service(dir: &PathBuf) -> HybridCartService<FakeRemote> {
        HybridCartService::new(LocalCartStore::new(dir), FakeRemote::default())
    }

    #[tokio::test]
    async fn test_guest_initialization() {
        let dir = temp_data_dir();
        let service = service(&dir);

        service.initialize(None).await.expect("init");
        assert_eq!(service.current_mode(), CartMode::Guest);
        assert!(service.cart().await.expect("cart").is_empty());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_sign_in_migrates_guest_lines() {
        let dir = temp_data_dir();
        let service = service(&dir);
        let user = UserId::new("user-1");

        service.initialize(None).await.expect("guest init");
        service
            .add_item(&ProductId::new("sku-1"), 2, dec("10.00"))
            .await
            .expect("guest add");

        service.initialize(Some(&user)).await.expect("auth init");
        assert_eq!(service.current_mode(), CartMode::Authenticated);

        let remote_lines = service.remote.load().await.expect("remote");
        assert_eq!(remote_lines.len(), 1);
        assert_eq!(remote_lines.first().map(|l| l.quantity), Some(2));

        // Guest file was drained by the migration.
        assert!(service.local.load().await.expect("local").is_empty());

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_repeated_initialize_is_idempotent() {
        let dir = temp_data_dir();
        let service = service(&dir);
        let user = UserId::new("user-1");

        service.initialize(None).await.expect("guest init");
        service
            .add_item(&ProductId::new("sku-1"), 2, dec("10.00"))
            .await
            .expect("guest add");

        service.initialize(Some(&user)).await.expect("first init");
        service.initialize(Some(&user)).await.expect("second init");

        // A second initialization must not double the migrated quantity.
        let remote_lines = service.remote.load().await.expect("remote");
        assert_eq!(remote_lines.first().map(|l| l.quantity), Some(2));

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_failed_migration_still_authenticates() {
        let dir = temp_data_dir();
        let service = service(&dir);
        let user = UserId::new("user-1");

        service.initialize(None).await.expect("guest init");
        service
            .add_item(&ProductId::new("sku-1"), 1, dec("5.00"))
            .await
            .expect("guest add");

        service.remote.fail_adds.store(true, Ordering::SeqCst);
        let result = service.initialize(Some(&user)).await;
        assert!(result.is_err());
        assert_eq!(service.current_mode(), CartMode::Authenticated);

        // Guest line was not lost; a later initialization retries it.
        assert_eq!(service.local.load().await.expect("local").len(), 1);
        service.remote.fail_adds.store(false, Ordering::SeqCst);
        service.initialize(Some(&user)).await.expect("retry");
        assert_eq!(service.remote.load().await.expect("remote").len(), 1);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
