pub mod app_config;
pub mod config_repo;
pub mod coupon_repo;
pub mod database;
pub mod exclusion_repo;
pub mod inventory_repo;
pub mod memory;
pub mod place_repo;
pub mod quota_repo;
pub mod redemption_repo;
pub mod redis_repo;
pub mod session_repo;
pub mod trip_repo;

pub use database::DbClient;
pub use memory::MemoryStore;
pub use redis_repo::RedisClient;

use spotto_core::GachaError;

/// Every persistence fault surfaces as the retryable store error; callers
/// never see driver types.
pub(crate) fn store_err(err: sqlx::Error) -> GachaError {
    GachaError::Store(err.to_string())
}
