//! In-memory repository doubles for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use spotto_catalog::{Place, PlaceRepository};
use spotto_core::{ConfigService, ConfigStore, GachaResult};
use spotto_shared::Locale;

use crate::exclusion::{ExclusionRecord, ExclusionScope};
use crate::models::DrawSession;
use crate::repository::{DrawSessionRepository, ExclusionRepository, TripRepository};
use crate::trips::PublishedTrip;

pub fn test_config() -> std::sync::Arc<ConfigService> {
    std::sync::Arc::new(ConfigService::new(std::sync::Arc::new(MapConfigStore::default())))
}

#[derive(Default)]
pub struct MapConfigStore {
    values: tokio::sync::Mutex<HashMap<(String, String), serde_json::Value>>,
}

#[async_trait]
impl ConfigStore for MapConfigStore {
    async fn get(&self, category: &str, key: &str) -> GachaResult<Option<serde_json::Value>> {
        Ok(self
            .values
            .lock()
            .await
            .get(&(category.to_string(), key.to_string()))
            .cloned())
    }

    async fn set(&self, category: &str, key: &str, value: serde_json::Value) -> GachaResult<()> {
        self.values
            .lock()
            .await
            .insert((category.to_string(), key.to_string()), value);
        Ok(())
    }
}

pub struct StubPlaceRepository {
    places: Vec<Place>,
}

impl StubPlaceRepository {
    pub fn new(places: Vec<Place>) -> Self {
        Self { places }
    }
}

#[async_trait]
impl PlaceRepository for StubPlaceRepository {
    async fn list_active(&self, locale: &Locale) -> GachaResult<Vec<Place>> {
        Ok(self
            .places
            .iter()
            .filter(|p| p.locale.city_key() == locale.city_key())
            .cloned()
            .collect())
    }

    async fn find_by_external_id(&self, external_id: &str) -> GachaResult<Option<Place>> {
        Ok(self
            .places
            .iter()
            .find(|p| p.external_id.as_deref() == Some(external_id))
            .cloned())
    }
}

#[derive(Default)]
pub struct MemoryExclusionRepository {
    records: Mutex<Vec<ExclusionRecord>>,
}

fn key_of(record: &ExclusionRecord) -> (Option<Uuid>, String, String) {
    let user = match record.scope {
        ExclusionScope::UserScored { user_id, .. } => Some(user_id),
        ExclusionScope::GlobalPermanent => None,
    };
    (user, record.place_name.clone(), record.locale.to_string())
}

#[async_trait]
impl ExclusionRepository for MemoryExclusionRepository {
    async fn upsert_penalty(
        &self,
        user_id: Uuid,
        place_name: &str,
        locale: &Locale,
    ) -> GachaResult<i64> {
        let mut records = self.records.lock().unwrap();
        let target = (Some(user_id), place_name.to_string(), locale.to_string());
        for record in records.iter_mut() {
            if key_of(record) == target {
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
        let mut records = self.records.lock().unwrap();
        let target = (None, place_name.to_string(), locale.to_string());
        if records.iter().any(|r| key_of(r) == target) {
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
        let records = self.records.lock().unwrap();
        let target = (Some(user_id), place_name.to_string(), locale.to_string());
        Ok(records.iter().find_map(|r| match (key_of(r) == target, &r.scope) {
            (true, ExclusionScope::UserScored { score, .. }) => Some(*score),
            _ => None,
        }))
    }

    async fn is_global(&self, place_name: &str, locale: &Locale) -> GachaResult<bool> {
        let records = self.records.lock().unwrap();
        let target = (None, place_name.to_string(), locale.to_string());
        Ok(records.iter().any(|r| key_of(r) == target))
    }

    async fn list_excluded_names(
        &self,
        user_id: Uuid,
        locale: &Locale,
        threshold: i64,
    ) -> GachaResult<HashSet<String>> {
        let records = self.records.lock().unwrap();
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
        let records = self.records.lock().unwrap();
        let target = (user_id, place_name.to_string(), locale.to_string());
        Ok(records.iter().find(|r| key_of(r) == target).cloned())
    }
}

#[derive(Default)]
pub struct MemoryTripRepository {
    trips: Mutex<Vec<PublishedTrip>>,
}

#[async_trait]
impl TripRepository for MemoryTripRepository {
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

#[derive(Default)]
pub struct MemoryDrawSessionRepository {
    sessions: Mutex<HashMap<Uuid, DrawSession>>,
}

#[async_trait]
impl DrawSessionRepository for MemoryDrawSessionRepository {
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
