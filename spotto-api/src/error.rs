use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use spotto_core::GachaError;

/// HTTP envelope for the engine's error taxonomy. Every failure carries its
/// machine-readable `code` so clients can render a precise message.
#[derive(Debug)]
pub struct AppError(pub GachaError);

impl From<GachaError> for AppError {
    fn from(err: GachaError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            GachaError::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
            GachaError::ItemNotFound => StatusCode::NOT_FOUND,
            GachaError::AlreadyRedeemed => StatusCode::CONFLICT,
            GachaError::ItemExpired => StatusCode::GONE,
            GachaError::NoMerchantCodeSet => StatusCode::CONFLICT,
            GachaError::MerchantCodeExpired => StatusCode::GONE,
            GachaError::InvalidCode => StatusCode::UNPROCESSABLE_ENTITY,
            GachaError::NoMerchantLink => StatusCode::UNPROCESSABLE_ENTITY,
            GachaError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
            GachaError::Store(msg) => {
                tracing::error!("store failure: {}", msg);
                StatusCode::SERVICE_UNAVAILABLE
            }
        };

        let body = Json(json!({
            "error": self.0.to_string(),
            "code": self.0.code(),
            "retryable": self.0.is_retryable(),
        }));

        (status, body).into_response()
    }
}
