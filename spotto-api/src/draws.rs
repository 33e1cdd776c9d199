use axum::{extract::State, routing::post, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spotto_catalog::Place;
use spotto_core::GachaError;
use spotto_shared::Locale;

use crate::auth::AuthedUser;
use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct DrawRequest {
    pub locale: Locale,
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct DrawResponse {
    pub session_id: Uuid,
    pub places: Vec<PlaceResponse>,
    pub shortfall: bool,
    pub won_tier: Option<String>,
    pub reward: Option<crate::inventory::ItemResponse>,
    pub reward_lost: bool,
    pub published_trip: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PlaceResponse {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub rating: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo_url: Option<String>,
    pub description: Option<String>,
}

impl From<Place> for PlaceResponse {
    fn from(place: Place) -> Self {
        Self {
            id: place.id,
            name: place.name,
            category: place.category.as_str().to_string(),
            rating: place.rating,
            latitude: place.latitude,
            longitude: place.longitude,
            photo_url: place.photo_url,
            description: place.description,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/draws", post(create_draw))
        .route("/v1/draws/quota", axum::routing::get(get_quota))
}

/// POST /v1/draws
/// Spend one draw: place recommendations plus, with luck, a coupon reward.
pub async fn create_draw(
    State(state): State<AppState>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
    Json(req): Json<DrawRequest>,
) -> Result<Json<DrawResponse>, AppError> {
    let count = req.count.unwrap_or(state.default_place_count);
    if count == 0 || count > 20 {
        return Err(AppError(GachaError::InvalidConfig(format!(
            "draw count {} out of range (1..=20)",
            count
        ))));
    }

    let outcome = state.engine.draw(user_id, &req.locale, count).await?;

    // The unread badge changed if a reward landed; drop the cached count.
    if outcome.reward.is_some() {
        let _ = state.redis.clear_unread_count(&user_id.to_string()).await;
    }

    Ok(Json(DrawResponse {
        session_id: outcome.session_id,
        places: outcome.places.into_iter().map(PlaceResponse::from).collect(),
        shortfall: outcome.shortfall,
        won_tier: outcome.won_tier.map(|t| t.as_str().to_string()),
        reward: outcome.reward.map(crate::inventory::ItemResponse::from),
        reward_lost: outcome.reward_lost,
        published_trip: outcome.published_trip,
    }))
}

/// GET /v1/draws/quota
/// How many draws today's allowance has left.
pub async fn get_quota(
    State(state): State<AppState>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
) -> Result<Json<serde_json::Value>, AppError> {
    let used = state.quota.daily_count(user_id).await?;
    let cap = state
        .config
        .get_i64(
            spotto_core::config::keys::CATEGORY_QUOTA,
            spotto_core::config::keys::DAILY_DRAW_CAP,
            spotto_inventory::quota::DEFAULT_DAILY_DRAW_CAP,
        )
        .await?;
    Ok(Json(serde_json::json!({
        "used": used,
        "cap": cap,
        "remaining": (cap - used).max(0),
    })))
}
