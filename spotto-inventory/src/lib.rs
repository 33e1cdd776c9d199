pub mod manager;
pub mod models;
pub mod quota;
pub mod redemption;
pub mod repository;

#[cfg(test)]
pub(crate) mod testutil;

pub use manager::InventoryManager;
pub use models::{
    Capacity, InventoryItem, ItemState, Redemption, RedemptionCode, RedemptionStatus,
    RewardPayload, MAX_SLOTS,
};
pub use quota::QuotaTracker;
pub use redemption::RedemptionProtocol;
pub use repository::{InventoryRepository, QuotaRepository, RedemptionRepository};
