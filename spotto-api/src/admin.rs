use axum::{
    extract::{Path, State},
    routing::{post, put},
    Json, Router,
};
use serde::Deserialize;

use spotto_core::config::keys;
use spotto_core::GachaError;
use spotto_gacha::WeightTable;
use spotto_shared::Locale;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GlobalExclusionRequest {
    pub place_name: Option<String>,
    pub place_external_id: Option<String>,
    pub locale: Locale,
}

#[derive(Debug, Deserialize)]
pub struct ConfigValueRequest {
    pub value: serde_json::Value,
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/config/rarity-weights", put(set_rarity_weights))
        .route("/v1/admin/config/{category}/{key}", put(set_config_value))
        .route("/v1/admin/exclusions/global", post(global_exclude))
}

/// PUT /v1/admin/config/rarity-weights
/// Validated before it lands; the next roll anywhere sees the new table.
pub async fn set_rarity_weights(
    State(state): State<AppState>,
    Json(weights): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    let table = WeightTable::from_value(&weights)?;
    state
        .config
        .set(keys::CATEGORY_GACHA, keys::RARITY_WEIGHTS, weights)
        .await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "total_weight": table.total(),
    })))
}

/// PUT /v1/admin/config/{category}/{key}
/// Raw knob access (daily draw cap, exclusion threshold, grace minutes).
pub async fn set_config_value(
    State(state): State<AppState>,
    Path((category, key)): Path<(String, String)>,
    Json(req): Json<ConfigValueRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.config.set(&category, &key, req.value).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// POST /v1/admin/exclusions/global
/// Accepts either the catalog name or the external catalog id.
pub async fn global_exclude(
    State(state): State<AppState>,
    Json(req): Json<GlobalExclusionRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let place_name = match (req.place_name, req.place_external_id) {
        (Some(name), _) => name,
        (None, Some(external_id)) => state
            .places
            .find_by_external_id(&external_id)
            .await?
            .ok_or_else(|| {
                AppError(GachaError::InvalidConfig(format!(
                    "unknown place external id: {}",
                    external_id
                )))
            })?
            .name,
        (None, None) => {
            return Err(AppError(GachaError::InvalidConfig(
                "place_name or place_external_id is required".to_string(),
            )))
        }
    };

    state.ledger.global_exclude(&place_name, &req.locale).await?;
    Ok(Json(serde_json::json!({ "success": true, "place_name": place_name })))
}
