//! Guest cart persistence backed by a local JSON file.
//!
//! This is the server-side analog of browser local storage: one file per
//! deployment holding the guest cart's lines. The in-memory line list is
//! authoritative while the process runs; every mutation rewrites the file.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::debug;

use tangelo_core::{CartLine, ProductId, UserId};

use super::{CartError, CartStore};

const GUEST_CART_FILE: &str = "guest-cart.json";

/// File-backed cart store for unauthenticated sessions.
pub struct LocalCartStore {
    path: PathBuf,
    lines: RwLock<Vec<CartLine>>,
}

impl LocalCartStore {
    /// Create a store persisting under `data_dir`.
    #[must_use]
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(GUEST_CART_FILE),
            lines: RwLock::new(Vec::new()),
        }
    }

    /// Path of the backing file (exposed for diagnostics).
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, lines: &[CartLine]) -> Result<(), CartError> {
        let json = serde_json::to_vec_pretty(lines)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}

impl CartStore for LocalCartStore {
    async fn initialize(&self, _user: Option<&UserId>) -> Result<(), CartError> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        // A missing file is a brand-new guest cart, not an error.
        let stored = match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice::<Vec<CartLine>>(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(lines = stored.len(), "Loaded guest cart");
        *self.lines.write().await = stored;
        Ok(())
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
        let mut lines = self.lines.write().await;

        // One line per product: repeated adds merge by quantity. The unit
        // price stays as snapshotted by the first add.
        if let Some(line) = lines.iter_mut().find(|l| &l.product_id == product_id) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            lines.push(CartLine {
                product_id: product_id.clone(),
                quantity,
                unit_price,
            });
        }

        self.persist(&lines).await
    }

    async fn update_quantity(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), CartError> {
        let mut lines = self.lines.write().await;

        // Updating an absent line is a successful no-op.
        let Some(line) = lines.iter_mut().find(|l| &l.product_id == product_id) else {
            return Ok(());
        };
        line.quantity = quantity;

        self.persist(&lines).await
    }

    async fn remove_item(&self, product_id: &ProductId) -> Result<(), CartError> {
        let mut lines = self.lines.write().await;
        let before = lines.len();
        lines.retain(|l| &l.product_id != product_id);

        // Removing a non-existent line is a successful no-op; skip the write.
        if lines.len() == before {
            return Ok(());
        }

        self.persist(&lines).await
    }
}
