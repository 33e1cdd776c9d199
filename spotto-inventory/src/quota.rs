use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use spotto_core::config::keys;
use spotto_core::{day, ConfigService, GachaError, GachaResult};

use crate::repository::QuotaRepository;

pub const DEFAULT_DAILY_DRAW_CAP: i64 = 3;

/// Per-user-per-day draw counters. All mutation goes through atomic upserts
/// at the store, so parallel draws for one user never lose an update.
pub struct QuotaTracker {
    repo: Arc<dyn QuotaRepository>,
    config: Arc<ConfigService>,
}

impl QuotaTracker {
    pub fn new(repo: Arc<dyn QuotaRepository>, config: Arc<ConfigService>) -> Self {
        Self { repo, config }
    }

    pub async fn daily_count(&self, user_id: Uuid) -> GachaResult<i64> {
        self.repo.count(user_id, day::today()).await
    }

    pub async fn increment(&self, user_id: Uuid, n: i64) -> GachaResult<i64> {
        self.repo.increment(user_id, day::today(), n).await
    }

    /// Admit one draw: a single capped increment decides admission and
    /// counts the draw in the same store round-trip.
    pub async fn admit_draw(&self, user_id: Uuid) -> GachaResult<i64> {
        let cap = self
            .config
            .get_i64(keys::CATEGORY_QUOTA, keys::DAILY_DRAW_CAP, DEFAULT_DAILY_DRAW_CAP)
            .await?;
        match self.repo.increment_capped(user_id, day::today(), 1, cap).await? {
            Some(total) => Ok(total),
            None => Err(GachaError::QuotaExceeded),
        }
    }

    /// Give a consumed admission back after a draw died mid-flight. Best
    /// effort: a failure here is logged, the caller is already surfacing a
    /// retryable store error.
    pub async fn compensate(&self, user_id: Uuid) {
        if let Err(err) = self.repo.increment(user_id, day::today(), -1).await {
            warn!(user_id = %user_id, error = %err, "failed to roll back draw quota");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MemoryQuotaRepository;
    use serde_json::json;
    use spotto_core::ConfigStore;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    struct MapConfigStore(Mutex<HashMap<(String, String), serde_json::Value>>);

    #[async_trait::async_trait]
    impl ConfigStore for MapConfigStore {
        async fn get(&self, category: &str, key: &str) -> GachaResult<Option<serde_json::Value>> {
            Ok(self.0.lock().await.get(&(category.to_string(), key.to_string())).cloned())
        }

        async fn set(&self, category: &str, key: &str, value: serde_json::Value) -> GachaResult<()> {
            self.0.lock().await.insert((category.to_string(), key.to_string()), value);
            Ok(())
        }
    }

    fn tracker() -> (QuotaTracker, Arc<ConfigService>) {
        let config = Arc::new(ConfigService::new(Arc::new(MapConfigStore(Mutex::new(HashMap::new())))));
        (
            QuotaTracker::new(Arc::new(MemoryQuotaRepository::default()), config.clone()),
            config,
        )
    }

    #[tokio::test]
    async fn test_admission_counts_and_caps() {
        let (tracker, _) = tracker();
        let user = Uuid::new_v4();

        for expected in 1..=DEFAULT_DAILY_DRAW_CAP {
            assert_eq!(tracker.admit_draw(user).await.unwrap(), expected);
        }
        assert!(matches!(tracker.admit_draw(user).await, Err(GachaError::QuotaExceeded)));
        assert_eq!(tracker.daily_count(user).await.unwrap(), DEFAULT_DAILY_DRAW_CAP);
    }

    #[tokio::test]
    async fn test_cap_is_runtime_configurable() {
        let (tracker, config) = tracker();
        let user = Uuid::new_v4();

        config
            .set(keys::CATEGORY_QUOTA, keys::DAILY_DRAW_CAP, json!(1))
            .await
            .unwrap();
        tracker.admit_draw(user).await.unwrap();
        assert!(matches!(tracker.admit_draw(user).await, Err(GachaError::QuotaExceeded)));
    }

    #[tokio::test]
    async fn test_increment_is_an_upsert() {
        let (tracker, _) = tracker();
        let user = Uuid::new_v4();

        assert_eq!(tracker.increment(user, 2).await.unwrap(), 2);
        assert_eq!(tracker.increment(user, 3).await.unwrap(), 5);
        assert_eq!(tracker.daily_count(user).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_compensation_returns_the_admission() {
        let (tracker, _) = tracker();
        let user = Uuid::new_v4();

        tracker.admit_draw(user).await.unwrap();
        tracker.compensate(user).await;
        assert_eq!(tracker.daily_count(user).await.unwrap(), 0);
        // The freed admission is usable again.
        assert_eq!(tracker.admit_draw(user).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_parallel_increments_lose_nothing() {
        let repo = Arc::new(MemoryQuotaRepository::default());
        let user = Uuid::new_v4();
        let today = day::today();

        let mut handles = Vec::new();
        for _ in 0..50 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.increment(user, today, 1).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(repo.count(user, today).await.unwrap(), 50);
    }
}
