use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spotto_inventory::{Capacity, InventoryItem};

use crate::auth::AuthedUser;
use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: Uuid,
    pub slot_index: i32,
    pub tier: String,
    pub coupon_id: Option<Uuid>,
    pub merchant_id: Option<Uuid>,
    pub is_read: bool,
    pub state: String,
    pub valid_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<InventoryItem> for ItemResponse {
    fn from(item: InventoryItem) -> Self {
        Self {
            id: item.id,
            slot_index: item.slot_index,
            tier: item.tier.as_str().to_string(),
            coupon_id: item.coupon_id,
            merchant_id: item.merchant_id,
            is_read: item.is_read,
            state: item.state.as_str().to_string(),
            valid_until: item.valid_until,
            created_at: item.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InventoryResponse {
    pub items: Vec<ItemResponse>,
    pub unread_count: i64,
}

#[derive(Debug, Deserialize)]
pub struct ExpiringQuery {
    #[serde(default = "default_days_ahead")]
    pub days: i64,
}

fn default_days_ahead() -> i64 {
    7
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/inventory", get(get_inventory))
        .route("/v1/inventory/capacity", get(get_capacity))
        .route("/v1/inventory/unread", get(get_unread_badge))
        .route("/v1/inventory/expiring", get(get_expiring))
        .route("/v1/inventory/{id}/read", post(mark_read))
        .route("/v1/inventory/{id}", delete(soft_delete))
}

/// GET /v1/inventory
pub async fn get_inventory(
    State(state): State<AppState>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
) -> Result<Json<InventoryResponse>, AppError> {
    let (items, unread_count) = state.inventory.list(user_id).await?;
    Ok(Json(InventoryResponse {
        items: items.into_iter().map(ItemResponse::from).collect(),
        unread_count,
    }))
}

/// GET /v1/inventory/capacity
pub async fn get_capacity(
    State(state): State<AppState>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
) -> Result<Json<Capacity>, AppError> {
    Ok(Json(state.inventory.capacity(user_id).await?))
}

/// GET /v1/inventory/unread
/// Badge count, served from the Redis cache when warm. Redis being down
/// just means a database count.
pub async fn get_unread_badge(
    State(state): State<AppState>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
) -> Result<Json<serde_json::Value>, AppError> {
    let key = user_id.to_string();
    if let Ok(Some(cached)) = state.redis.get_unread_count(&key).await {
        return Ok(Json(serde_json::json!({ "unread_count": cached })));
    }

    let (_, unread_count) = state.inventory.list(user_id).await?;
    let _ = state.redis.set_unread_count(&key, unread_count, 300).await;
    Ok(Json(serde_json::json!({ "unread_count": unread_count })))
}

/// GET /v1/inventory/expiring?days=7
pub async fn get_expiring(
    State(state): State<AppState>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
    Query(query): Query<ExpiringQuery>,
) -> Result<Json<Vec<ItemResponse>>, AppError> {
    let items = state.inventory.list_expiring(user_id, query.days).await?;
    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

/// POST /v1/inventory/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.inventory.mark_read(user_id, item_id).await?;
    let _ = state.redis.clear_unread_count(&user_id.to_string()).await;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// DELETE /v1/inventory/{id}
pub async fn soft_delete(
    State(state): State<AppState>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
    Path(item_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.inventory.soft_delete(user_id, item_id).await?;
    let _ = state.redis.clear_unread_count(&user_id.to_string()).await;
    Ok(Json(serde_json::json!({ "success": true })))
}
