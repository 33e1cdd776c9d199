use axum::{
    extract::State,
    http::Method,
    response::IntoResponse,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod admin;
pub mod auth;
pub mod draws;
pub mod error;
pub mod inventory;
pub mod redemptions;
pub mod state;
pub mod worker;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let user_routes = Router::new()
        .merge(draws::routes())
        .merge(inventory::routes())
        .merge(redemptions::routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::user_auth_middleware,
        ));

    let admin_routes = Router::new()
        .merge(admin::routes())
        .merge(redemptions::merchant_routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::admin_auth_middleware,
        ));

    Router::new()
        .merge(user_routes)
        .merge(admin_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
        .with_state(state)
}

async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<impl IntoResponse, impl IntoResponse> {
    let key = match req.headers().get("Authorization").and_then(|h| h.to_str().ok()) {
        Some(token) => format!("ratelimit:{}", token),
        None => "ratelimit:anonymous".to_string(),
    };

    match state.redis.check_rate_limit(&key, 100, 60).await {
        Ok(true) => Ok(next.run(req).await),
        Ok(false) => Err((axum::http::StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded")),
        Err(_) => Ok(next.run(req).await), // Fail open
    }
}
