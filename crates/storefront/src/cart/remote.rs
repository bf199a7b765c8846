//! Remote cart API client for authenticated carts.
//!
//! Plain JSON over HTTP with a bearer token. Cart state is mutable, so
//! nothing here is cached; every read goes to the API.

use std::sync::{Arc, RwLock};

use reqwest::StatusCode;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use tangelo_core::{CartLine, ProductId, UserId};

use crate::config::CartApiConfig;

use super::{CartError, CartStore};

/// Client for the remote cart API.
///
/// Cheaply cloneable via `Arc`. The store is bound to a user during
/// `initialize`; operations before binding fail with
/// [`CartError::Uninitialized`].
#[derive(Clone)]
pub struct RemoteCartStore {
    inner: Arc<RemoteCartStoreInner>,
}

struct RemoteCartStoreInner {
    client: reqwest::Client,
    base_url: String,
    token: String,
    user: RwLock<Option<UserId>>,
}

/// Wire shape of a cart fetch response.
#[derive(Debug, Deserialize)]
struct CartPayload {
    #[serde(default)]
    items: Vec<CartLine>,
}

/// Wire shape of an add-line request.
#[derive(Debug, Serialize)]
struct AddLineRequest<'a> {
    product_id: &'a ProductId,
    quantity: u32,
    unit_price: Decimal,
}

/// Wire shape of a quantity update request.
#[derive(Debug, Serialize)]
struct UpdateLineRequest {
    quantity: u32,
}

impl RemoteCartStore {
    /// Create a new cart API client.
    #[must_use]
    pub fn new(config: &CartApiConfig) -> Self {
        Self {
            inner: Arc::new(RemoteCartStoreInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.trim_end_matches('/').to_string(),
                token: config.token.expose_secret().to_string(),
                user: RwLock::new(None),
            }),
        }
    }

    fn bound_user(&self) -> Result<UserId, CartError> {
        self.inner
            .user
            .read()
            .ok()
            .and_then(|guard| guard.clone())
            .ok_or(CartError::Uninitialized)
    }

    fn cart_url(&self, user: &UserId) -> String {
        format!("{}/carts/{}", self.inner.base_url, user)
    }

    fn line_url(&self, user: &UserId, product_id: &ProductId) -> String {
        format!("{}/lines/{}", self.cart_url(user), product_id)
    }

    /// Probe the API for reachability; used by the connectivity watcher.
    pub async fn ping(&self) -> bool {
        let url = format!("{}/health", self.inner.base_url);
        matches!(
            self.inner
                .client
                .get(&url)
                .bearer_auth(&self.inner.token)
                .send()
                .await,
            Ok(response) if response.status().is_success()
        )
    }

    /// Map a non-success response into a `CartError`.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, CartError> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CartError::RateLimited(retry_after));
        }

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(200)
                .collect::<String>();
            return Err(CartError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }
}

impl CartStore for RemoteCartStore {
    #[instrument(skip(self))]
    async fn initialize(&self, user: Option<&UserId>) -> Result<(), CartError> {
        let user = user.ok_or(CartError::Uninitialized)?;
        if let Ok(mut guard) = self.inner.user.write() {
            *guard = Some(user.clone());
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn load(&self) -> Result<Vec<CartLine>, CartError> {
        let user = self.bound_user()?;

        let response = self
            .inner
            .client
            .get(self.cart_url(&user))
            .bearer_auth(&self.inner.token)
            .send()
            .await?;

        // No cart yet is a valid empty state, never an error.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        let response = Self::check(response).await?;
        let payload: CartPayload = response.json().await?;
        Ok(payload.items)
    }

    #[instrument(skip(self, unit_price))]
    async fn add_item(
        &self,
        product_id: &ProductId,
        quantity: u32,
        unit_price: Decimal,
    ) -> Result<(), CartError> {
        let user = self.bound_user()?;

        let response = self
            .inner
            .client
            .post(format!("{}/lines", self.cart_url(&user)))
            .bearer_auth(&self.inner.token)
            .json(&AddLineRequest {
                product_id,
                quantity,
                unit_price,
            })
            .send()
            .await?;

        Self::check(response).await.map(drop)
    }

    #[instrument(skip(self))]
    async fn update_quantity(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), CartError> {
        let user = self.bound_user()?;

        let response = self
            .inner
            .client
            .patch(self.line_url(&user, product_id))
            .bearer_auth(&self.inner.token)
            .json(&UpdateLineRequest { quantity })
            .send()
            .await?;

        Self::check(response).await.map(drop)
    }

    #[instrument(skip(self))]
    async fn remove_item(&self, product_id: &ProductId) -> Result<(), CartError> {
        let user = self.bound_user()?;

        let response = self
            .inner
            .client
            .delete(self.line_url(&user, product_id))
            .bearer_auth(&self.inner.token)
            .send()
            .await?;

        // Removing a line that is already gone is a successful no-op.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }

        Self::check(response).await.map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn store() -> RemoteCartStore {
        RemoteCartStore::new(&CartApiConfig {
            base_url: "https://cart.example.test/".to_string(),
            token: SecretString::from("t0k3n"),
        })
    }

    #[test]
    fn test_urls_strip_trailing_slash() {
        let store = store();
        let user = UserId::new("user-1");
        assert_eq!(
            store.cart_url(&user),
            "https://cart.example.test/carts/user-1"
        );
        assert_eq!(
            store.line_url(&user, &ProductId::new("sku-1")),
            "https://cart.example.test/carts/user-1/lines/sku-1"
        );
    }

    #[tokio::test]
    async fn test_operations_before_binding_fail() {
        let store = store();
        let result = store.load().await;
        assert!(matches!(result, Err(CartError::Uninitialized)));
    }

    #[tokio::test]
    async fn test_initialize_requires_user() {
        let store = store();
        assert!(matches!(
            store.initialize(None).await,
            Err(CartError::Uninitialized)
        ));
        assert!(store.initialize(Some(&UserId::new("u"))).await.is_ok());
    }
}
