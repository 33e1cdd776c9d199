use uuid::Uuid;

use crate::reward::RewardTier;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct RewardAdmittedEvent {
    pub user_id: Uuid,
    pub item_id: Uuid,
    pub slot_index: i32,
    pub tier: RewardTier,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct ItemsExpiringEvent {
    pub user_id: Uuid,
    pub item_ids: Vec<Uuid>,
    pub days_ahead: i64,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct TripPublishedEvent {
    pub trip_id: i64,
    pub city_key: String,
    pub place_count: usize,
    pub timestamp: i64,
}
