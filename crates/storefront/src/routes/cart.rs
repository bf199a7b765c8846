//! Cart route handlers.
//!
//! Handlers never surface cart mutation failures as HTTP errors: the
//! manager reports outcomes through notifications, so every mutation
//! responds with the current snapshot plus the notifications it produced.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::instrument;

use tangelo_core::{CartMode, NewCartItem, ProductId, SyncStatus};

use crate::notify::Notification;
use crate::state::AppState;

/// Cart line display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemView {
    pub product_id: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

/// Cart display data.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub subtotal: String,
    pub total: String,
    pub mode: CartMode,
    pub sync_status: SyncStatus,
    pub online: bool,
}

/// Format a decimal amount as a price string.
fn format_price(amount: Decimal) -> String {
    format!("${amount:.2}")
}

impl CartView {
    fn from_state(state: &AppState) -> Self {
        let manager = state.cart();
        let snapshot = manager.snapshot();

        Self {
            items: snapshot
                .lines
                .iter()
                .map(|line| CartItemView {
                    product_id: line.product_id.to_string(),
                    quantity: line.quantity,
                    price: format_price(line.unit_price),
                    line_price: format_price(line.line_total()),
                })
                .collect(),
            item_count: snapshot.item_count,
            subtotal: format_price(snapshot.subtotal),
            total: format_price(snapshot.total),
            mode: manager.mode(),
            sync_status: manager.sync_status(),
            online: manager.is_online(),
        }
    }
}

/// Response for cart mutations: the fresh snapshot plus the notifications
/// the operation produced.
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub cart: CartView,
    pub notifications: Vec<Notification>,
}

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: Option<i64>,
}

/// Update quantity request body.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

/// Collect the notifications published since `rx` was created.
fn drain_notifications(rx: &mut broadcast::Receiver<Notification>) -> Vec<Notification> {
    let mut notifications = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(notification) => notifications.push(notification),
            Err(broadcast::error::TryRecvError::Lagged(_)) => {}
            Err(_) => break,
        }
    }
    notifications
}

/// Current cart snapshot.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> impl IntoResponse {
    Json(CartView::from_state(&state))
}

/// Cart count badge value.
#[instrument(skip(state))]
pub async fn count(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({ "count": state.cart().snapshot().item_count }))
}

/// Add an item to the cart.
#[instrument(skip(state, request), fields(product_id = %request.product_id))]
pub async fn add(
    State(state): State<AppState>,
    Json(request): Json<AddToCartRequest>,
) -> impl IntoResponse {
    let mut notifications = state.cart().notifications();

    let item = NewCartItem {
        product_id: request.product_id,
        name: request.name,
        unit_price: request.unit_price,
    };
    state.cart().add_item(&item, request.quantity.unwrap_or(1)).await;

    Json(MutationResponse {
        cart: CartView::from_state(&state),
        notifications: drain_notifications(&mut notifications),
    })
}

/// Update a line's quantity.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    Json(request): Json<UpdateQuantityRequest>,
) -> impl IntoResponse {
    let mut notifications = state.cart().notifications();

    state
        .cart()
        .update_quantity(&product_id, request.quantity)
        .await;

    Json(MutationResponse {
        cart: CartView::from_state(&state),
        notifications: drain_notifications(&mut notifications),
    })
}

/// Remove a line from the cart.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> impl IntoResponse {
    let mut notifications = state.cart().notifications();

    state.cart().remove_item(&product_id).await;

    Json(MutationResponse {
        cart: CartView::from_state(&state),
        notifications: drain_notifications(&mut notifications),
    })
}

/// Remove every line from the cart.
#[instrument(skip(state))]
pub async fn clear(State(state): State<AppState>) -> impl IntoResponse {
    let mut notifications = state.cart().notifications();

    state.cart().clear_cart().await;

    Json(MutationResponse {
        cart: CartView::from_state(&state),
        notifications: drain_notifications(&mut notifications),
    })
}

/// Re-fetch the snapshot from the cart service.
#[instrument(skip(state))]
pub async fn refresh(State(state): State<AppState>) -> impl IntoResponse {
    state.cart().refresh_cart().await;
    Json(CartView::from_state(&state))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price_two_decimals() {
        assert_eq!(format_price("5".parse().expect("decimal")), "$5.00");
        assert_eq!(format_price("49.19".parse().expect("decimal")), "$49.19");
        assert_eq!(format_price("64.8".parse().expect("decimal")), "$64.80");
    }
}
