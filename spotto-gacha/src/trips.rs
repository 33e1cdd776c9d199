use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use spotto_core::GachaResult;
use spotto_shared::Locale;

use crate::repository::TripRepository;

/// Trips shorter than this never publish.
pub const MIN_TRIP_PLACES: usize = 3;

/// How far back the duplicate check looks, per city.
pub const DEDUP_WINDOW: i64 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedTrip {
    pub id: i64,
    pub city_key: String,
    pub place_ids: Vec<Uuid>,
    pub published_at: DateTime<Utc>,
}

/// Publishes finished draw compositions to the public feed, rejecting
/// order-independent duplicates within a recent window. Publication is
/// permanent.
pub struct TripPublisher {
    repo: Arc<dyn TripRepository>,
}

impl TripPublisher {
    pub fn new(repo: Arc<dyn TripRepository>) -> Self {
        Self { repo }
    }

    pub async fn should_publish(&self, locale: &Locale, place_ids: &[Uuid]) -> GachaResult<bool> {
        if place_ids.len() < MIN_TRIP_PLACES {
            return Ok(false);
        }

        let candidate = sorted_set(place_ids);
        let recent = self
            .repo
            .recent_place_sets(&locale.city_key(), DEDUP_WINDOW)
            .await?;
        Ok(!recent.iter().any(|prior| sorted_set(prior) == candidate))
    }

    pub async fn publish(&self, locale: &Locale, place_ids: Vec<Uuid>) -> GachaResult<PublishedTrip> {
        let trip = self.repo.insert(&locale.city_key(), &place_ids).await?;
        info!(trip_id = trip.id, city = %trip.city_key, "trip published");
        Ok(trip)
    }

    /// Human-readable per-city numbering; not part of the dedup.
    pub async fn sequence_number(&self, locale: &Locale, trip_id: i64) -> GachaResult<i64> {
        self.repo
            .count_published_upto(&locale.city_key(), trip_id)
            .await
    }
}

fn sorted_set(place_ids: &[Uuid]) -> Vec<Uuid> {
    let mut ids = place_ids.to_vec();
    ids.sort();
    ids.dedup();
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MemoryTripRepository;

    fn publisher() -> TripPublisher {
        TripPublisher::new(Arc::new(MemoryTripRepository::default()))
    }

    fn locale() -> Locale {
        Locale::new("JP", "Kyoto", None)
    }

    #[tokio::test]
    async fn test_reordered_set_is_a_duplicate() {
        let publisher = publisher();
        let locale = locale();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        assert!(publisher.should_publish(&locale, &[a, b, c]).await.unwrap());
        publisher.publish(&locale, vec![a, b, c]).await.unwrap();

        assert!(!publisher.should_publish(&locale, &[c, b, a]).await.unwrap());
        assert!(!publisher.should_publish(&locale, &[a, b, c]).await.unwrap());
    }

    #[tokio::test]
    async fn test_same_set_in_another_city_publishes() {
        let publisher = publisher();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        publisher.publish(&locale(), vec![a, b, c]).await.unwrap();
        let elsewhere = Locale::new("JP", "Nara", None);
        assert!(publisher.should_publish(&elsewhere, &[a, b, c]).await.unwrap());
    }

    #[tokio::test]
    async fn test_short_trips_never_publish() {
        let publisher = publisher();
        assert!(!publisher
            .should_publish(&locale(), &[Uuid::new_v4(), Uuid::new_v4()])
            .await
            .unwrap());
        assert!(!publisher.should_publish(&locale(), &[]).await.unwrap());
    }

    #[tokio::test]
    async fn test_sequence_numbers_count_per_city() {
        let publisher = publisher();
        let locale = locale();

        let first = publisher
            .publish(&locale, vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()])
            .await
            .unwrap();
        let second = publisher
            .publish(&locale, vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()])
            .await
            .unwrap();

        assert_eq!(publisher.sequence_number(&locale, first.id).await.unwrap(), 1);
        assert_eq!(publisher.sequence_number(&locale, second.id).await.unwrap(), 2);
    }
}
