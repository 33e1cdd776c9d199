use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use spotto_core::GachaResult;

use crate::models::{InventoryItem, Redemption, RedemptionCode};

/// Persistence boundary for the slot table. Slot uniqueness is enforced
/// here, not in application logic: `try_insert` returns `false` when the
/// (user, slot) pair is already taken by a non-deleted row, and the caller
/// retries with the next free slot.
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn try_insert(&self, item: &InventoryItem) -> GachaResult<bool>;

    async fn get(&self, item_id: Uuid) -> GachaResult<Option<InventoryItem>>;

    /// Slot indexes currently held by non-deleted items.
    async fn occupied_slots(&self, user_id: Uuid) -> GachaResult<Vec<i32>>;

    /// Non-deleted items, slot order.
    async fn list_for_user(&self, user_id: Uuid) -> GachaResult<Vec<InventoryItem>>;

    async fn update(&self, item: &InventoryItem) -> GachaResult<()>;

    async fn unread_count(&self, user_id: Uuid) -> GachaResult<i64>;

    /// Non-deleted items whose validity window closes before `before`.
    async fn list_expiring_before(
        &self,
        user_id: Uuid,
        before: DateTime<Utc>,
    ) -> GachaResult<Vec<InventoryItem>>;
}

/// Per-user-per-day draw counters. Both increments are atomic upserts at
/// the store; parallel calls never lose updates.
#[async_trait]
pub trait QuotaRepository: Send + Sync {
    /// Unconditional atomic add (create at `n` if absent). Returns the new
    /// total. `n` may be negative for compensation.
    async fn increment(&self, user_id: Uuid, day: NaiveDate, n: i64) -> GachaResult<i64>;

    /// Atomic add that refuses to cross `cap`: returns `None` (and leaves
    /// the counter untouched) when `count + n > cap`.
    async fn increment_capped(
        &self,
        user_id: Uuid,
        day: NaiveDate,
        n: i64,
        cap: i64,
    ) -> GachaResult<Option<i64>>;

    async fn count(&self, user_id: Uuid, day: NaiveDate) -> GachaResult<i64>;
}

#[async_trait]
pub trait RedemptionRepository: Send + Sync {
    /// Upsert: a merchant has at most one active code and a new issuance
    /// replaces the previous one atomically.
    async fn put_merchant_code(&self, code: &RedemptionCode) -> GachaResult<()>;

    async fn get_merchant_code(&self, merchant_id: Uuid) -> GachaResult<Option<RedemptionCode>>;

    async fn insert(&self, redemption: &Redemption) -> GachaResult<()>;

    async fn get(&self, id: Uuid) -> GachaResult<Option<Redemption>>;

    async fn update(&self, redemption: &Redemption) -> GachaResult<()>;

    /// Verified redemptions whose grace deadline has passed.
    async fn list_overdue(&self, now: DateTime<Utc>) -> GachaResult<Vec<Redemption>>;
}
