//! In-memory repository doubles for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use spotto_catalog::{Coupon, CouponRepository};
use spotto_core::GachaResult;
use spotto_shared::RewardTier;

use crate::models::{InventoryItem, ItemState, Redemption, RedemptionCode};
use crate::repository::{InventoryRepository, QuotaRepository, RedemptionRepository};

#[derive(Default)]
pub struct MemoryInventoryRepository {
    items: Mutex<HashMap<Uuid, InventoryItem>>,
}

#[async_trait]
impl InventoryRepository for MemoryInventoryRepository {
    async fn try_insert(&self, item: &InventoryItem) -> GachaResult<bool> {
        let mut items = self.items.lock().unwrap();
        let taken = items.values().any(|existing| {
            existing.user_id == item.user_id
                && existing.slot_index == item.slot_index
                && existing.state != ItemState::Deleted
        });
        if taken {
            return Ok(false);
        }
        items.insert(item.id, item.clone());
        Ok(true)
    }

    async fn get(&self, item_id: Uuid) -> GachaResult<Option<InventoryItem>> {
        Ok(self.items.lock().unwrap().get(&item_id).cloned())
    }

    async fn occupied_slots(&self, user_id: Uuid) -> GachaResult<Vec<i32>> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .values()
            .filter(|i| i.user_id == user_id && i.state != ItemState::Deleted)
            .map(|i| i.slot_index)
            .collect())
    }

    async fn list_for_user(&self, user_id: Uuid) -> GachaResult<Vec<InventoryItem>> {
        let mut items: Vec<InventoryItem> = self
            .items
            .lock()
            .unwrap()
            .values()
            .filter(|i| i.user_id == user_id && i.state != ItemState::Deleted)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.slot_index);
        Ok(items)
    }

    async fn update(&self, item: &InventoryItem) -> GachaResult<()> {
        self.items.lock().unwrap().insert(item.id, item.clone());
        Ok(())
    }

    async fn unread_count(&self, user_id: Uuid) -> GachaResult<i64> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .values()
            .filter(|i| i.user_id == user_id && i.state != ItemState::Deleted && !i.is_read)
            .count() as i64)
    }

    async fn list_expiring_before(
        &self,
        user_id: Uuid,
        before: DateTime<Utc>,
    ) -> GachaResult<Vec<InventoryItem>> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .values()
            .filter(|i| {
                i.user_id == user_id
                    && i.state != ItemState::Deleted
                    && matches!(i.valid_until, Some(until) if until <= before)
            })
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryQuotaRepository {
    counts: Mutex<HashMap<(Uuid, NaiveDate), i64>>,
}

#[async_trait]
impl QuotaRepository for MemoryQuotaRepository {
    async fn increment(&self, user_id: Uuid, day: NaiveDate, n: i64) -> GachaResult<i64> {
        let mut counts = self.counts.lock().unwrap();
        let entry = counts.entry((user_id, day)).or_insert(0);
        *entry += n;
        Ok(*entry)
    }

    async fn increment_capped(
        &self,
        user_id: Uuid,
        day: NaiveDate,
        n: i64,
        cap: i64,
    ) -> GachaResult<Option<i64>> {
        let mut counts = self.counts.lock().unwrap();
        let entry = counts.entry((user_id, day)).or_insert(0);
        if *entry + n > cap {
            return Ok(None);
        }
        *entry += n;
        Ok(Some(*entry))
    }

    async fn count(&self, user_id: Uuid, day: NaiveDate) -> GachaResult<i64> {
        Ok(*self.counts.lock().unwrap().get(&(user_id, day)).unwrap_or(&0))
    }
}

#[derive(Default)]
pub struct MemoryRedemptionRepository {
    codes: Mutex<HashMap<Uuid, RedemptionCode>>,
    redemptions: Mutex<HashMap<Uuid, Redemption>>,
}

#[async_trait]
impl RedemptionRepository for MemoryRedemptionRepository {
    async fn put_merchant_code(&self, code: &RedemptionCode) -> GachaResult<()> {
        self.codes.lock().unwrap().insert(code.merchant_id, code.clone());
        Ok(())
    }

    async fn get_merchant_code(&self, merchant_id: Uuid) -> GachaResult<Option<RedemptionCode>> {
        Ok(self.codes.lock().unwrap().get(&merchant_id).cloned())
    }

    async fn insert(&self, redemption: &Redemption) -> GachaResult<()> {
        self.redemptions.lock().unwrap().insert(redemption.id, redemption.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> GachaResult<Option<Redemption>> {
        Ok(self.redemptions.lock().unwrap().get(&id).cloned())
    }

    async fn update(&self, redemption: &Redemption) -> GachaResult<()> {
        self.redemptions.lock().unwrap().insert(redemption.id, redemption.clone());
        Ok(())
    }

    async fn list_overdue(&self, now: DateTime<Utc>) -> GachaResult<Vec<Redemption>> {
        Ok(self
            .redemptions
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.is_overdue(now))
            .cloned()
            .collect())
    }
}

/// Coupon catalog double that records how often stock was decremented.
#[derive(Default)]
pub struct CountingCouponRepository {
    pub coupons: Mutex<HashMap<Uuid, Coupon>>,
    pub decrements: AtomicUsize,
}

impl CountingCouponRepository {
    pub fn with_coupon(coupon: Coupon) -> Self {
        let repo = Self::default();
        repo.coupons.lock().unwrap().insert(coupon.id, coupon);
        repo
    }

    pub fn decrement_count(&self) -> usize {
        self.decrements.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CouponRepository for CountingCouponRepository {
    async fn list_active(&self, merchant_id: Uuid) -> GachaResult<Vec<Coupon>> {
        Ok(self
            .coupons
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.merchant_id == merchant_id && c.is_active)
            .cloned()
            .collect())
    }

    async fn list_active_for_tier(&self, tier: RewardTier) -> GachaResult<Vec<Coupon>> {
        Ok(self
            .coupons
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.tier == tier && c.is_active)
            .cloned()
            .collect())
    }

    async fn get(&self, coupon_id: Uuid) -> GachaResult<Option<Coupon>> {
        Ok(self.coupons.lock().unwrap().get(&coupon_id).cloned())
    }

    async fn decrement_remaining(&self, coupon_id: Uuid) -> GachaResult<()> {
        let mut coupons = self.coupons.lock().unwrap();
        if let Some(coupon) = coupons.get_mut(&coupon_id) {
            if let Some(remaining) = coupon.remaining.as_mut() {
                *remaining -= 1;
            }
        }
        self.decrements.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
