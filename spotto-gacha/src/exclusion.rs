use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use spotto_core::config::keys;
use spotto_core::{ConfigService, GachaResult};
use spotto_shared::Locale;

pub const DEFAULT_EXCLUSION_THRESHOLD: i64 = 3;

/// Who an exclusion applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExclusionScope {
    /// Accumulating per-user signal; excludes once the score crosses the
    /// configured threshold.
    UserScored { user_id: Uuid, score: i64 },
    /// Operator-placed sentinel: the place is gone for everyone, forever.
    GlobalPermanent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExclusionRecord {
    pub scope: ExclusionScope,
    pub place_name: String,
    pub locale: Locale,
    pub last_seen: DateTime<Utc>,
}

/// Penalty scoring that suppresses rejected places from future draws.
pub struct ExclusionLedger {
    repo: Arc<dyn crate::repository::ExclusionRepository>,
    config: Arc<ConfigService>,
}

impl ExclusionLedger {
    pub fn new(
        repo: Arc<dyn crate::repository::ExclusionRepository>,
        config: Arc<ConfigService>,
    ) -> Self {
        Self { repo, config }
    }

    async fn threshold(&self) -> GachaResult<i64> {
        self.config
            .get_i64(
                keys::CATEGORY_GACHA,
                keys::EXCLUSION_THRESHOLD,
                DEFAULT_EXCLUSION_THRESHOLD,
            )
            .await
    }

    pub async fn is_excluded(
        &self,
        user_id: Uuid,
        place_name: &str,
        locale: &Locale,
    ) -> GachaResult<bool> {
        if self.repo.is_global(place_name, locale).await? {
            return Ok(true);
        }
        let threshold = self.threshold().await?;
        Ok(matches!(
            self.repo.get_user_score(user_id, place_name, locale).await?,
            Some(score) if score >= threshold
        ))
    }

    /// Record one more rejection of the place by this user.
    pub async fn penalize(
        &self,
        user_id: Uuid,
        place_name: &str,
        locale: &Locale,
    ) -> GachaResult<i64> {
        let score = self.repo.upsert_penalty(user_id, place_name, locale).await?;
        info!(user_id = %user_id, place = place_name, score, "place penalized");
        Ok(score)
    }

    /// Permanently remove the place from every user's pool. Idempotent.
    pub async fn global_exclude(&self, place_name: &str, locale: &Locale) -> GachaResult<()> {
        self.repo.insert_global(place_name, locale).await?;
        info!(place = place_name, locale = %locale, "place globally excluded");
        Ok(())
    }

    /// The full suppressed-name set consulted once per draw.
    pub async fn excluded_names(
        &self,
        user_id: Uuid,
        locale: &Locale,
    ) -> GachaResult<HashSet<String>> {
        let threshold = self.threshold().await?;
        self.repo.list_excluded_names(user_id, locale, threshold).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{test_config, MemoryExclusionRepository};

    fn ledger() -> ExclusionLedger {
        ExclusionLedger::new(Arc::new(MemoryExclusionRepository::default()), test_config())
    }

    fn locale() -> Locale {
        Locale::new("KR", "Seoul", Some("Hongdae".to_string()))
    }

    #[tokio::test]
    async fn test_user_score_excludes_at_threshold() {
        let ledger = ledger();
        let user = Uuid::new_v4();
        let locale = locale();

        assert!(!ledger.is_excluded(user, "Cafe Onion", &locale).await.unwrap());
        ledger.penalize(user, "Cafe Onion", &locale).await.unwrap();
        ledger.penalize(user, "Cafe Onion", &locale).await.unwrap();
        assert!(!ledger.is_excluded(user, "Cafe Onion", &locale).await.unwrap());

        let score = ledger.penalize(user, "Cafe Onion", &locale).await.unwrap();
        assert_eq!(score, 3);
        assert!(ledger.is_excluded(user, "Cafe Onion", &locale).await.unwrap());

        // Scores are per user.
        assert!(!ledger
            .is_excluded(Uuid::new_v4(), "Cafe Onion", &locale)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_global_exclusion_applies_to_everyone() {
        let ledger = ledger();
        let locale = locale();

        ledger.global_exclude("Closed Diner", &locale).await.unwrap();
        // Idempotent.
        ledger.global_exclude("Closed Diner", &locale).await.unwrap();

        for _ in 0..3 {
            assert!(ledger
                .is_excluded(Uuid::new_v4(), "Closed Diner", &locale)
                .await
                .unwrap());
        }
    }

    #[tokio::test]
    async fn test_penalty_records_carry_user_scope() {
        use crate::repository::ExclusionRepository;

        let repo = Arc::new(MemoryExclusionRepository::default());
        let ledger = ExclusionLedger::new(repo.clone(), test_config());
        let user = Uuid::new_v4();
        let locale = locale();

        ledger.penalize(user, "Cafe Onion", &locale).await.unwrap();
        ledger.global_exclude("Closed Diner", &locale).await.unwrap();

        let scored = repo
            .get_record(Some(user), "Cafe Onion", &locale)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(scored.scope, ExclusionScope::UserScored { user_id: user, score: 1 });

        let global = repo
            .get_record(None, "Closed Diner", &locale)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(global.scope, ExclusionScope::GlobalPermanent);
    }

    #[tokio::test]
    async fn test_excluded_names_combines_global_and_scored() {
        let ledger = ledger();
        let user = Uuid::new_v4();
        let locale = locale();

        ledger.global_exclude("Closed Diner", &locale).await.unwrap();
        for _ in 0..3 {
            ledger.penalize(user, "Cafe Onion", &locale).await.unwrap();
        }
        ledger.penalize(user, "Okay Bar", &locale).await.unwrap();

        let names = ledger.excluded_names(user, &locale).await.unwrap();
        assert!(names.contains("Closed Diner"));
        assert!(names.contains("Cafe Onion"));
        assert!(!names.contains("Okay Bar"));
    }
}
