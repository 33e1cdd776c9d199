use std::collections::HashSet;

use async_trait::async_trait;
use uuid::Uuid;

use spotto_core::GachaResult;
use spotto_shared::Locale;

use crate::exclusion::ExclusionRecord;
use crate::models::DrawSession;
use crate::trips::PublishedTrip;

#[async_trait]
pub trait ExclusionRepository: Send + Sync {
    /// Atomic upsert: create the user's record at score 1, else add 1.
    /// Returns the new score.
    async fn upsert_penalty(
        &self,
        user_id: Uuid,
        place_name: &str,
        locale: &Locale,
    ) -> GachaResult<i64>;

    /// Idempotent insert of the permanent sentinel.
    async fn insert_global(&self, place_name: &str, locale: &Locale) -> GachaResult<()>;

    async fn get_user_score(
        &self,
        user_id: Uuid,
        place_name: &str,
        locale: &Locale,
    ) -> GachaResult<Option<i64>>;

    async fn is_global(&self, place_name: &str, locale: &Locale) -> GachaResult<bool>;

    /// Names excluded for this user in this locale: every global sentinel
    /// plus the user's own records at or above `threshold`.
    async fn list_excluded_names(
        &self,
        user_id: Uuid,
        locale: &Locale,
        threshold: i64,
    ) -> GachaResult<HashSet<String>>;

    async fn get_record(
        &self,
        user_id: Option<Uuid>,
        place_name: &str,
        locale: &Locale,
    ) -> GachaResult<Option<ExclusionRecord>>;
}

#[async_trait]
pub trait TripRepository: Send + Sync {
    /// Persist and assign the monotonically increasing trip id.
    async fn insert(&self, city_key: &str, place_ids: &[Uuid]) -> GachaResult<PublishedTrip>;

    /// Place-id lists of the most recently published trips in a city,
    /// newest first, at most `limit` of them.
    async fn recent_place_sets(&self, city_key: &str, limit: i64) -> GachaResult<Vec<Vec<Uuid>>>;

    /// Published trips in the city with id at or below `trip_id`.
    async fn count_published_upto(&self, city_key: &str, trip_id: i64) -> GachaResult<i64>;
}

#[async_trait]
pub trait DrawSessionRepository: Send + Sync {
    async fn insert(&self, session: &DrawSession) -> GachaResult<()>;

    async fn set_published(&self, session_id: Uuid) -> GachaResult<()>;

    async fn get(&self, session_id: Uuid) -> GachaResult<Option<DrawSession>>;
}
