use axum::{
    extract::{Path, State},
    routing::{post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spotto_inventory::Redemption;

use crate::auth::AuthedUser;
use crate::error::AppError;
use crate::inventory::ItemResponse;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub item_id: Uuid,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct RedemptionResponse {
    pub id: Uuid,
    pub item_id: Uuid,
    pub status: String,
    pub verified_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl From<Redemption> for RedemptionResponse {
    fn from(r: Redemption) -> Self {
        Self {
            id: r.id,
            item_id: r.item_id,
            status: r.status.as_str().to_string(),
            verified_at: r.verified_at,
            expires_at: r.expires_at,
            confirmed_at: r.confirmed_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub item: ItemResponse,
    pub redemption: RedemptionResponse,
}

#[derive(Debug, Deserialize)]
pub struct IssueCodeRequest {
    pub code: String,
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/redemptions/verify", post(verify))
        .route("/v1/redemptions/{id}/confirm", post(confirm))
}

pub fn merchant_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/merchants/{id}/code", put(issue_code))
        .route("/v1/merchants/{id}/coupons", axum::routing::get(list_coupons))
}

/// POST /v1/redemptions/verify
/// Check the merchant's code against an inventory item; on success the item
/// is consumed and the confirmation grace window opens.
pub async fn verify(
    State(state): State<AppState>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, AppError> {
    let (item, redemption) = state.protocol.verify(user_id, req.item_id, &req.code).await?;
    Ok(Json(VerifyResponse {
        success: true,
        item: ItemResponse::from(item),
        redemption: RedemptionResponse::from(redemption),
    }))
}

/// POST /v1/redemptions/{id}/confirm
pub async fn confirm(
    State(state): State<AppState>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
    Path(redemption_id): Path<Uuid>,
) -> Result<Json<RedemptionResponse>, AppError> {
    let redemption = state.protocol.confirm(user_id, redemption_id).await?;
    Ok(Json(RedemptionResponse::from(redemption)))
}

/// GET /v1/merchants/{id}/coupons
/// What the merchant can currently hand out.
pub async fn list_coupons(
    State(state): State<AppState>,
    Path(merchant_id): Path<Uuid>,
) -> Result<Json<Vec<spotto_catalog::Coupon>>, AppError> {
    Ok(Json(state.coupons.list_active(merchant_id).await?))
}

/// PUT /v1/merchants/{id}/code
/// Replace the merchant's day code. Admin surface: merchants go through the
/// partner dashboard, which holds an admin token.
pub async fn issue_code(
    State(state): State<AppState>,
    Path(merchant_id): Path<Uuid>,
    Json(req): Json<IssueCodeRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let code = state.protocol.issue_code(merchant_id, req.code).await?;
    Ok(Json(serde_json::json!({
        "merchant_id": code.merchant_id,
        "issued_at": code.issued_at,
    })))
}
