use std::sync::Arc;

use spotto_catalog::{CouponRepository, PlaceRepository};
use spotto_core::ConfigService;
use spotto_gacha::{DrawEngine, ExclusionLedger};
use spotto_inventory::{InventoryManager, QuotaTracker, RedemptionProtocol};
use spotto_store::RedisClient;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<DrawEngine>,
    pub inventory: Arc<InventoryManager>,
    pub protocol: Arc<RedemptionProtocol>,
    pub quota: Arc<QuotaTracker>,
    pub ledger: Arc<ExclusionLedger>,
    pub places: Arc<dyn PlaceRepository>,
    pub coupons: Arc<dyn CouponRepository>,
    pub config: Arc<ConfigService>,
    pub redis: Arc<RedisClient>,
    pub auth: AuthConfig,
    pub default_place_count: usize,
}
