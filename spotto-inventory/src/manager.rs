use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use spotto_core::{GachaError, GachaResult};

use crate::models::{Capacity, InventoryItem, ItemState, RewardPayload, MAX_SLOTS};
use crate::repository::InventoryRepository;

/// Capacity-bounded slot store. Slots are reused: the first gap in the
/// non-deleted set is always claimed next.
pub struct InventoryManager {
    repo: Arc<dyn InventoryRepository>,
}

impl InventoryManager {
    pub fn new(repo: Arc<dyn InventoryRepository>) -> Self {
        Self { repo }
    }

    pub async fn slot_count(&self, user_id: Uuid) -> GachaResult<i32> {
        Ok(self.repo.occupied_slots(user_id).await?.len() as i32)
    }

    pub async fn is_full(&self, user_id: Uuid) -> GachaResult<bool> {
        Ok(self.slot_count(user_id).await? >= MAX_SLOTS)
    }

    /// First free slot index, or `None` when every slot is taken.
    pub async fn next_free_slot(&self, user_id: Uuid) -> GachaResult<Option<i32>> {
        let occupied: HashSet<i32> = self.repo.occupied_slots(user_id).await?.into_iter().collect();
        Ok((0..MAX_SLOTS).find(|slot| !occupied.contains(slot)))
    }

    /// Claim a slot and insert the reward. Returns `Ok(None)` when the
    /// inventory is full: the reward is lost, the draw is not. A slot
    /// conflict from a racing admission is retried with the next gap.
    pub async fn admit(
        &self,
        user_id: Uuid,
        payload: RewardPayload,
    ) -> GachaResult<Option<InventoryItem>> {
        loop {
            let slot = match self.next_free_slot(user_id).await? {
                Some(slot) => slot,
                None => {
                    debug!(user_id = %user_id, "inventory full, reward dropped");
                    return Ok(None);
                }
            };

            let item = InventoryItem::new(user_id, slot, payload.clone());
            if self.repo.try_insert(&item).await? {
                debug!(user_id = %user_id, slot, item_id = %item.id, "reward admitted");
                return Ok(Some(item));
            }
            // Lost the slot to a concurrent admission; the re-scan picks the
            // next gap or reports full.
        }
    }

    pub async fn mark_read(&self, user_id: Uuid, item_id: Uuid) -> GachaResult<()> {
        let mut item = self.owned_item(user_id, item_id).await?;
        if item.is_read {
            return Ok(());
        }
        item.is_read = true;
        item.updated_at = Utc::now();
        self.repo.update(&item).await
    }

    /// Frees the slot while keeping the row. Already-deleted items (or items
    /// the caller does not own) surface as not found.
    pub async fn soft_delete(&self, user_id: Uuid, item_id: Uuid) -> GachaResult<()> {
        let item = self.repo.get(item_id).await?;
        let mut item = match item {
            Some(item) if item.user_id == user_id => item,
            _ => return Err(GachaError::ItemNotFound),
        };
        if item.state == ItemState::Deleted {
            return Ok(());
        }
        item.set_state(ItemState::Deleted);
        self.repo.update(&item).await
    }

    pub async fn list(&self, user_id: Uuid) -> GachaResult<(Vec<InventoryItem>, i64)> {
        let items = self.repo.list_for_user(user_id).await?;
        let unread = self.repo.unread_count(user_id).await?;
        Ok((items, unread))
    }

    pub async fn capacity(&self, user_id: Uuid) -> GachaResult<Capacity> {
        let used = self.slot_count(user_id).await?;
        Ok(Capacity {
            used,
            max: MAX_SLOTS,
            available: MAX_SLOTS - used,
        })
    }

    /// Active items whose validity window closes within `days_ahead` days.
    /// Feeds the expiring-soon notification collaborator.
    pub async fn list_expiring(
        &self,
        user_id: Uuid,
        days_ahead: i64,
    ) -> GachaResult<Vec<InventoryItem>> {
        let before = Utc::now() + Duration::days(days_ahead);
        let items = self.repo.list_expiring_before(user_id, before).await?;
        Ok(items.into_iter().filter(InventoryItem::is_active).collect())
    }

    async fn owned_item(&self, user_id: Uuid, item_id: Uuid) -> GachaResult<InventoryItem> {
        match self.repo.get(item_id).await? {
            Some(item) if item.user_id == user_id && item.state != ItemState::Deleted => Ok(item),
            // Ownership is never leaked: someone else's item and a missing
            // item are the same answer.
            _ => Err(GachaError::ItemNotFound),
        }
    }
}
