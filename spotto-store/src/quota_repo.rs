use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use spotto_core::GachaResult;
use spotto_inventory::QuotaRepository;

use crate::store_err;

pub struct PgQuotaRepository {
    pool: PgPool,
}

impl PgQuotaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuotaRepository for PgQuotaRepository {
    async fn increment(&self, user_id: Uuid, day: NaiveDate, n: i64) -> GachaResult<i64> {
        let row = sqlx::query(
            r#"
            INSERT INTO draw_quota (user_id, day, count)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, day)
            DO UPDATE SET count = draw_quota.count + EXCLUDED.count
            RETURNING count
            "#,
        )
        .bind(user_id)
        .bind(day)
        .bind(n)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;

        row.try_get("count").map_err(store_err)
    }

    async fn increment_capped(
        &self,
        user_id: Uuid,
        day: NaiveDate,
        n: i64,
        cap: i64,
    ) -> GachaResult<Option<i64>> {
        // Single round trip: the conditional upsert refuses to cross the
        // cap and returns no row, leaving the counter untouched.
        let row = sqlx::query(
            r#"
            INSERT INTO draw_quota (user_id, day, count)
            SELECT $1, $2, $3 WHERE $3 <= $4
            ON CONFLICT (user_id, day)
            DO UPDATE SET count = draw_quota.count + $3
            WHERE draw_quota.count + $3 <= $4
            RETURNING count
            "#,
        )
        .bind(user_id)
        .bind(day)
        .bind(n)
        .bind(cap)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.map(|r| r.try_get("count").map_err(store_err)).transpose()
    }

    async fn count(&self, user_id: Uuid, day: NaiveDate) -> GachaResult<i64> {
        let row = sqlx::query("SELECT count FROM draw_quota WHERE user_id = $1 AND day = $2")
            .bind(user_id)
            .bind(day)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;

        match row {
            Some(row) => row.try_get("count").map_err(store_err),
            None => Ok(0),
        }
    }
}
