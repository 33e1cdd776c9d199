use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use spotto_core::GachaResult;
use spotto_gacha::{ExclusionRecord, ExclusionRepository, ExclusionScope};
use spotto_shared::Locale;

use crate::store_err;

pub struct PgExclusionRepository {
    pool: PgPool,
}

impl PgExclusionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// District is stored as '' (never NULL) so the uniqueness keys stay simple.
fn district_of(locale: &Locale) -> &str {
    locale.district.as_deref().unwrap_or("")
}

#[async_trait]
impl ExclusionRepository for PgExclusionRepository {
    async fn upsert_penalty(
        &self,
        user_id: Uuid,
        place_name: &str,
        locale: &Locale,
    ) -> GachaResult<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO exclusions (id, user_id, place_name, country, city, district, score, is_global, last_seen)
            VALUES ($1, $2, $3, $4, $5, $6, 1, FALSE, NOW())
            ON CONFLICT (user_id, place_name, country, city, district) WHERE user_id IS NOT NULL
            DO UPDATE SET score = exclusions.score + 1, last_seen = NOW()
            RETURNING score
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(place_name)
        .bind(&locale.country)
        .bind(&locale.city)
        .bind(district_of(locale))
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;

        row.try_get("score").map_err(store_err)
    }

    async fn insert_global(&self, place_name: &str, locale: &Locale) -> GachaResult<()> {
        sqlx::query(
            r#"
            INSERT INTO exclusions (id, user_id, place_name, country, city, district, score, is_global, last_seen)
            VALUES ($1, NULL, $2, $3, $4, $5, 0, TRUE, NOW())
            ON CONFLICT (place_name, country, city, district) WHERE user_id IS NULL
            DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(place_name)
        .bind(&locale.country)
        .bind(&locale.city)
        .bind(district_of(locale))
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn get_user_score(
        &self,
        user_id: Uuid,
        place_name: &str,
        locale: &Locale,
    ) -> GachaResult<Option<i64>> {
        let row = sqlx::query(
            r#"
            SELECT score FROM exclusions
            WHERE user_id = $1 AND place_name = $2 AND country = $3 AND city = $4 AND district = $5
            "#,
        )
        .bind(user_id)
        .bind(place_name)
        .bind(&locale.country)
        .bind(&locale.city)
        .bind(district_of(locale))
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.map(|r| r.try_get("score").map_err(store_err)).transpose()
    }

    async fn is_global(&self, place_name: &str, locale: &Locale) -> GachaResult<bool> {
        let row = sqlx::query(
            r#"
            SELECT 1 AS hit FROM exclusions
            WHERE user_id IS NULL AND is_global AND place_name = $1 AND country = $2 AND city = $3 AND district = $4
            "#,
        )
        .bind(place_name)
        .bind(&locale.country)
        .bind(&locale.city)
        .bind(district_of(locale))
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(row.is_some())
    }

    async fn list_excluded_names(
        &self,
        user_id: Uuid,
        locale: &Locale,
        threshold: i64,
    ) -> GachaResult<HashSet<String>> {
        // City-wide scan: a global sentinel placed on one district still
        // suppresses the place anywhere it appears in the city.
        let rows = sqlx::query(
            r#"
            SELECT place_name FROM exclusions
            WHERE country = $1 AND city = $2
              AND (is_global OR (user_id = $3 AND score >= $4))
            "#,
        )
        .bind(&locale.country)
        .bind(&locale.city)
        .bind(user_id)
        .bind(threshold)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.iter()
            .map(|row| row.try_get("place_name").map_err(store_err))
            .collect()
    }

    async fn get_record(
        &self,
        user_id: Option<Uuid>,
        place_name: &str,
        locale: &Locale,
    ) -> GachaResult<Option<ExclusionRecord>> {
        let row = match user_id {
            Some(user_id) => {
                sqlx::query(
                    r#"
                    SELECT user_id, score, is_global, last_seen FROM exclusions
                    WHERE user_id = $1 AND place_name = $2 AND country = $3 AND city = $4 AND district = $5
                    "#,
                )
                .bind(user_id)
                .bind(place_name)
                .bind(&locale.country)
                .bind(&locale.city)
                .bind(district_of(locale))
                .fetch_optional(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    r#"
                    SELECT user_id, score, is_global, last_seen FROM exclusions
                    WHERE user_id IS NULL AND place_name = $1 AND country = $2 AND city = $3 AND district = $4
                    "#,
                )
                .bind(place_name)
                .bind(&locale.country)
                .bind(&locale.city)
                .bind(district_of(locale))
                .fetch_optional(&self.pool)
                .await
            }
        }
        .map_err(store_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let owner: Option<Uuid> = row.try_get("user_id").map_err(store_err)?;
        let scope = match owner {
            Some(user_id) => ExclusionScope::UserScored {
                user_id,
                score: row.try_get("score").map_err(store_err)?,
            },
            None => ExclusionScope::GlobalPermanent,
        };
        Ok(Some(ExclusionRecord {
            scope,
            place_name: place_name.to_string(),
            locale: locale.clone(),
            last_seen: row.try_get("last_seen").map_err(store_err)?,
        }))
    }
}
