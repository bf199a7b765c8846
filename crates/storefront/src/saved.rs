//! Saved-for-later items.
//!
//! Saved products live under the persistent storage key `Saved4Later` as a
//! serialized list, the same shape the browser front end keeps in local
//! storage. Other views observe changes through [`SavedForLaterStore::reload`]
//! plus a watch channel on the item count, the analog of storage-change and
//! tab-visibility signals keeping multi-view badges consistent.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{RwLock, watch};
use tracing::{debug, instrument};

use tangelo_core::ProductId;

/// Persistent storage key for the saved-items list.
pub const SAVED_ITEMS_KEY: &str = "Saved4Later";

/// Errors reading or writing the saved-items list.
#[derive(Debug, Error)]
pub enum SavedItemsError {
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A product set aside for later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub saved_at: DateTime<Utc>,
}

/// File-backed saved-for-later list with a published item count.
pub struct SavedForLaterStore {
    path: PathBuf,
    items: RwLock<Vec<SavedItem>>,
    count: watch::Sender<usize>,
}

impl SavedForLaterStore {
    /// Create a store persisting under `data_dir`.
    #[must_use]
    pub fn new(data_dir: &Path) -> Self {
        let (count, _) = watch::channel(0);
        Self {
            path: data_dir.join(format!("{SAVED_ITEMS_KEY}.json")),
            items: RwLock::new(Vec::new()),
            count,
        }
    }

    /// Load the persisted list; a missing file is an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn initialize(&self) -> Result<(), SavedItemsError> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        self.reload().await
    }

    /// Re-read the list from storage and republish the count.
    ///
    /// This is how external changes (another view or process writing the
    /// same key) become visible.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    #[instrument(skip(self))]
    pub async fn reload(&self) -> Result<(), SavedItemsError> {
        let stored = match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice::<Vec<SavedItem>>(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(items = stored.len(), "Reloaded saved items");
        self.count.send_replace(stored.len());
        *self.items.write().await = stored;
        Ok(())
    }

    /// Save the item, or remove it if already saved. Returns `true` when
    /// the item ended up saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the updated list cannot be persisted.
    #[instrument(skip(self, item), fields(product_id = %item.product_id))]
    pub async fn toggle(&self, item: SavedItem) -> Result<bool, SavedItemsError> {
        let mut items = self.items.write().await;

        let saved = if let Some(pos) = items
            .iter()
            .position(|i| i.product_id == item.product_id)
        {
            items.remove(pos);
            false
        } else {
            items.push(item);
            true
        };

        let json = serde_json::to_vec_pretty(&*items)?;
        tokio::fs::write(&self.path, json).await?;
        self.count.send_replace(items.len());
        Ok(saved)
    }

    /// Current saved items.
    pub async fn list(&self) -> Vec<SavedItem> {
        self.items.read().await.clone()
    }

    /// Current item count.
    #[must_use]
    pub fn count(&self) -> usize {
        *self.count.borrow()
    }

    /// Subscribe to item-count changes.
    #[must_use]
    pub fn subscribe_count(&self) -> watch::Receiver<usize> {
        self.count.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str) -> SavedItem {
        SavedItem {
            product_id: ProductId::new(id),
            name: format!("Product {id}"),
            unit_price: "19.99".parse().expect("decimal"),
            saved_at: Utc::now(),
        }
    }

    fn temp_data_dir() -> PathBuf {
        std::env::temp_dir().join(format!("tangelo-saved-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_toggle_saves_then_removes() {
        let dir = temp_data_dir();
        let store = SavedForLaterStore::new(&dir);
        store.initialize().await.expect("init");

        assert!(store.toggle(item("sku-1")).await.expect("toggle"));
        assert_eq!(store.count(), 1);

        assert!(!store.toggle(item("sku-1")).await.expect("toggle"));
        assert_eq!(store.count(), 0);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_reload_picks_up_external_writes() {
        let dir = temp_data_dir();
        let store = SavedForLaterStore::new(&dir);
        store.initialize().await.expect("init");
        store.toggle(item("sku-1")).await.expect("toggle");

        // A second view over the same storage key.
        let other = SavedForLaterStore::new(&dir);
        other.initialize().await.expect("init");
        assert_eq!(other.count(), 1);
        other.toggle(item("sku-2")).await.expect("toggle");

        // First view observes the change only after a reload.
        assert_eq!(store.count(), 1);
        store.reload().await.expect("reload");
        assert_eq!(store.count(), 2);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_count_watch_publishes() {
        let dir = temp_data_dir();
        let store = SavedForLaterStore::new(&dir);
        store.initialize().await.expect("init");
        let mut rx = store.subscribe_count();
        rx.mark_unchanged();

        store.toggle(item("sku-1")).await.expect("toggle");
        rx.changed().await.expect("count published");
        assert_eq!(*rx.borrow(), 1);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
