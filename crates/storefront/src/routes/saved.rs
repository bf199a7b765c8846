//! Saved-for-later route handlers.

use axum::{Json, extract::State, response::IntoResponse};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use tangelo_core::ProductId;

use crate::error::Result;
use crate::saved::SavedItem;
use crate::state::AppState;

/// Toggle request body.
#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
}

/// List saved items with their count.
///
/// # Route
///
/// `GET /saved`
#[instrument(skip(state))]
pub async fn list(State(state): State<AppState>) -> impl IntoResponse {
    let items = state.saved().list().await;
    Json(serde_json::json!({
        "count": items.len(),
        "items": items,
    }))
}

/// Save an item, or unsave it if already saved.
///
/// # Route
///
/// `POST /saved/toggle`
#[instrument(skip(state, request), fields(product_id = %request.product_id))]
pub async fn toggle(
    State(state): State<AppState>,
    Json(request): Json<ToggleRequest>,
) -> Result<impl IntoResponse> {
    let saved = state
        .saved()
        .toggle(SavedItem {
            product_id: request.product_id,
            name: request.name,
            unit_price: request.unit_price,
            saved_at: Utc::now(),
        })
        .await?;

    Ok(Json(serde_json::json!({
        "saved": saved,
        "count": state.saved().count(),
    })))
}

/// Re-read the shared storage key (storage-change signal analog).
///
/// # Route
///
/// `POST /saved/reload`
#[instrument(skip(state))]
pub async fn reload(State(state): State<AppState>) -> Result<impl IntoResponse> {
    state.saved().reload().await?;
    Ok(Json(serde_json::json!({ "count": state.saved().count() })))
}
