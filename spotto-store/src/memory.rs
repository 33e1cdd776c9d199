//! In-memory backend implementing every repository trait. Used by the
//! engine integration tests and for running the API without Postgres.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use spotto_catalog::{Coupon, CouponRepository, Place, PlaceRepository};
use spotto_core::{ConfigStore, GachaResult};
use spotto_gacha::{
    DrawSession, DrawSessionRepository, ExclusionRecord, ExclusionRepository, ExclusionScope,
    PublishedTrip, TripRepository,
};
use spotto_inventory::{
    InventoryItem, InventoryRepository, ItemState, QuotaRepository, Redemption, RedemptionCode,
    RedemptionRepository,
};
use spotto_shared::{Locale, RewardTier};

#[derive(Default)]
pub struct MemoryStore {
    places: Mutex<Vec<Place>>,
    coupons: Mutex<HashMap<Uuid, Coupon>>,
    items: Mutex<HashMap<Uuid, InventoryItem>>,
    quota: Mutex<HashMap<(Uuid, NaiveDate), i64>>,
    exclusions: Mutex<Vec<ExclusionRecord>>,
    trips: Mutex<Vec<PublishedTrip>>,
    sessions: Mutex<HashMap<Uuid, DrawSession>>,
    codes: Mutex<HashMap<Uuid, RedemptionCode>>,
    redemptions: Mutex<HashMap<Uuid, Redemption>>,
    config: Mutex<HashMap<(String, String), serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_place(&self, place: Place) {
        self.places.lock().unwrap().push(place);
    }

    pub fn add_coupon(&self, coupon: Coupon) {
        self.coupons.lock().unwrap().insert(coupon.id, coupon);
    }

    pub fn coupon(&self, id: Uuid) -> Option<Coupon> {
        self.coupons.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl PlaceRepository for MemoryStore {
    async fn list_active(&self, locale: &Locale) -> GachaResult<Vec<Place>> {
        Ok(self
            .places
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.is_active && p.locale.city_key() == locale.city_key())
            .filter(|p| match (&locale.district, &p.locale.district) {
                (Some(want), Some(have)) => want == have,
                (Some(_), None) => false,
                (None, _) => true,
            })
            .cloned()
            .collect())
    }

    async fn find_by_external_id(&self, external_id: &str) -> GachaResult<Option<Place>> {
        Ok(self
            .places
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.external_id.as_deref() == Some(external_id))
            .cloned())
    }
}

#[async_trait]
impl CouponRepository for MemoryStore {
    async fn list_active(&self, merchant_id: Uuid) -> GachaResult<Vec<Coupon>> {
        Ok(self
            .coupons
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.is_active && c.merchant_id == merchant_id)
            .cloned()
            .collect())
    }

    async fn list_active_for_tier(&self, tier: RewardTier) -> GachaResult<Vec<Coupon>> {
        Ok(self
            .coupons
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.is_active && c.tier == tier)
            .cloned()
            .collect())
    }

    async fn get(&self, coupon_id: Uuid) -> GachaResult<Option<Coupon>> {
        Ok(self.coupons.lock().unwrap().get(&coupon_id).cloned())
    }

    async fn decrement_remaining(&self, coupon_id: Uuid) -> GachaResult<()> {
        if let Some(coupon) = self.coupons.lock().unwrap().get_mut(&coupon_id) {
            if let Some(remaining) = coupon.remaining.as_mut() {
                *remaining = (*remaining - 1).max(0);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl InventoryRepository for MemoryStore {
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

#[async_trait]
impl QuotaRepository for MemoryStore {
    async fn increment(&self, user_id: Uuid, day: NaiveDate, n: i64) -> GachaResult<i64> {
        let mut quota = self.quota.lock().unwrap();
        let entry = quota.entry((user_id, day)).or_insert(0);
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
        let mut quota = self.quota.lock().unwrap();
        let entry = quota.entry((user_id, day)).or_insert(0);
        if *entry + n > cap {
            return Ok(None);
        }
        *entry += n;
        Ok(Some(*entry))
    }

    async fn count(&self, user_id: Uuid, day: NaiveDate) -> GachaResult<i64> {
        Ok(*self.quota.lock().unwrap().get(&(user_id, day)).unwrap_or(&0))
    }
}

fn exclusion_key(record: &ExclusionRecord) -> (Option<Uuid>, String, String) {
    let user = match record.scope {
        ExclusionScope::UserScored { user_id, .. } => Some(user_id),
        ExclusionScope::GlobalPermanent => None,
    };
    (user, record.place_name.clone(), record.locale.to_string())
}

#[async_trait]
impl ExclusionRepository for MemoryStore {
    async fn upsert_penalty(
        &self,
        user_id: Uuid,
        place_name: &str,
        locale: &Locale,
    ) -> GachaResult<i64> {
        let mut records = self.exclusions.lock().unwrap();
        let target = (Some(user_id), place_name.to_string(), locale.to_string());
        for record in records.iter_mut() {
            if exclusion_key(record) == target {
                if let ExclusionScope::UserScored { ref mut score, .. } = record.scope {
                    *score += 1;
                    record.last_seen = Utc::now();
                    return Ok(*score);
                }
            }
        }
        records.push(ExclusionRecord {
            scope: ExclusionScope::UserScored { user_id, score: 1 },
            place_name: place_name.to_string(),
            locale: locale.clone(),
            last_seen: Utc::now(),
        });
        Ok(1)
    }

    async fn insert_global(&self, place_name: &str, locale: &Locale) -> GachaResult<()> {
        let mut records = self.exclusions.lock().unwrap();
        let target = (None, place_name.to_string(), locale.to_string());
        if records.iter().any(|r| exclusion_key(r) == target) {
            return Ok(());
        }
        records.push(ExclusionRecord {
            scope: ExclusionScope::GlobalPermanent,
            place_name: place_name.to_string(),
            locale: locale.clone(),
            last_seen: Utc::now(),
        });
        Ok(())
    }

    async fn get_user_score(
        &self,
        user_id: Uuid,
        place_name: &str,
        locale: &Locale,
    ) -> GachaResult<Option<i64>> {
        let records = self.exclusions.lock().unwrap();
        let target = (Some(user_id), place_name.to_string(), locale.to_string());
        Ok(records.iter().find_map(|r| match (exclusion_key(r) == target, &r.scope) {
            (true, ExclusionScope::UserScored { score, .. }) => Some(*score),
            _ => None,
        }))
    }

    async fn is_global(&self, place_name: &str, locale: &Locale) -> GachaResult<bool> {
        let records = self.exclusions.lock().unwrap();
        let target = (None, place_name.to_string(), locale.to_string());
        Ok(records.iter().any(|r| exclusion_key(r) == target))
    }

    async fn list_excluded_names(
        &self,
        user_id: Uuid,
        locale: &Locale,
        threshold: i64,
    ) -> GachaResult<HashSet<String>> {
        let records = self.exclusions.lock().unwrap();
        Ok(records
            .iter()
            .filter(|r| r.locale.city_key() == locale.city_key())
            .filter(|r| match r.scope {
                ExclusionScope::GlobalPermanent => true,
                ExclusionScope::UserScored { user_id: owner, score } => {
                    owner == user_id && score >= threshold
                }
            })
            .map(|r| r.place_name.clone())
            .collect())
    }

    async fn get_record(
        &self,
        user_id: Option<Uuid>,
        place_name: &str,
        locale: &Locale,
    ) -> GachaResult<Option<ExclusionRecord>> {
        let records = self.exclusions.lock().unwrap();
        let target = (user_id, place_name.to_string(), locale.to_string());
        Ok(records.iter().find(|r| exclusion_key(r) == target).cloned())
    }
}

#[async_trait]
impl TripRepository for MemoryStore {
    async fn insert(&self, city_key: &str, place_ids: &[Uuid]) -> GachaResult<PublishedTrip> {
        let mut trips = self.trips.lock().unwrap();
        let trip = PublishedTrip {
            id: trips.len() as i64 + 1,
            city_key: city_key.to_string(),
            place_ids: place_ids.to_vec(),
            published_at: Utc::now(),
        };
        trips.push(trip.clone());
        Ok(trip)
    }

    async fn recent_place_sets(&self, city_key: &str, limit: i64) -> GachaResult<Vec<Vec<Uuid>>> {
        let trips = self.trips.lock().unwrap();
        Ok(trips
            .iter()
            .rev()
            .filter(|t| t.city_key == city_key)
            .take(limit as usize)
            .map(|t| t.place_ids.clone())
            .collect())
    }

    async fn count_published_upto(&self, city_key: &str, trip_id: i64) -> GachaResult<i64> {
        let trips = self.trips.lock().unwrap();
        Ok(trips
            .iter()
            .filter(|t| t.city_key == city_key && t.id <= trip_id)
            .count() as i64)
    }
}

#[async_trait]
impl DrawSessionRepository for MemoryStore {
    async fn insert(&self, session: &DrawSession) -> GachaResult<()> {
        self.sessions.lock().unwrap().insert(session.id, session.clone());
        Ok(())
    }

    async fn set_published(&self, session_id: Uuid) -> GachaResult<()> {
        if let Some(session) = self.sessions.lock().unwrap().get_mut(&session_id) {
            session.published = true;
        }
        Ok(())
    }

    async fn get(&self, session_id: Uuid) -> GachaResult<Option<DrawSession>> {
        Ok(self.sessions.lock().unwrap().get(&session_id).cloned())
    }
}

#[async_trait]
impl RedemptionRepository for MemoryStore {
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

#[async_trait]
impl ConfigStore for MemoryStore {
    async fn get(&self, category: &str, key: &str) -> GachaResult<Option<serde_json::Value>> {
        Ok(self
            .config
            .lock()
            .unwrap()
            .get(&(category.to_string(), key.to_string()))
            .cloned())
    }

    async fn set(&self, category: &str, key: &str, value: serde_json::Value) -> GachaResult<()> {
        self.config
            .lock()
            .unwrap()
            .insert((category.to_string(), key.to_string()), value);
        Ok(())
    }
}
