use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use spotto_core::{GachaError, GachaResult};
use spotto_inventory::{Redemption, RedemptionCode, RedemptionRepository, RedemptionStatus};
use spotto_shared::Masked;

use crate::store_err;

pub struct PgRedemptionRepository {
    pool: PgPool,
}

impl PgRedemptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn redemption_from_row(row: &sqlx::postgres::PgRow) -> GachaResult<Redemption> {
    let status: String = row.try_get("status").map_err(store_err)?;
    Ok(Redemption {
        id: row.try_get("id").map_err(store_err)?,
        item_id: row.try_get("item_id").map_err(store_err)?,
        user_id: row.try_get("user_id").map_err(store_err)?,
        status: RedemptionStatus::parse(&status)
            .ok_or_else(|| GachaError::Store(format!("unknown redemption status: {}", status)))?,
        verified_at: row.try_get("verified_at").map_err(store_err)?,
        expires_at: row.try_get("expires_at").map_err(store_err)?,
        confirmed_at: row.try_get("confirmed_at").map_err(store_err)?,
    })
}

#[async_trait]
impl RedemptionRepository for PgRedemptionRepository {
    async fn put_merchant_code(&self, code: &RedemptionCode) -> GachaResult<()> {
        sqlx::query(
            r#"
            INSERT INTO merchant_codes (merchant_id, code, issued_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (merchant_id)
            DO UPDATE SET code = EXCLUDED.code, issued_at = EXCLUDED.issued_at
            "#,
        )
        .bind(code.merchant_id)
        .bind(code.code.get())
        .bind(code.issued_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn get_merchant_code(&self, merchant_id: Uuid) -> GachaResult<Option<RedemptionCode>> {
        let row = sqlx::query("SELECT merchant_id, code, issued_at FROM merchant_codes WHERE merchant_id = $1")
            .bind(merchant_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_err)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let code: String = row.try_get("code").map_err(store_err)?;
        Ok(Some(RedemptionCode {
            merchant_id: row.try_get("merchant_id").map_err(store_err)?,
            code: Masked(code),
            issued_at: row.try_get("issued_at").map_err(store_err)?,
        }))
    }

    async fn insert(&self, redemption: &Redemption) -> GachaResult<()> {
        sqlx::query(
            r#"
            INSERT INTO redemptions (id, item_id, user_id, status, verified_at, expires_at, confirmed_at)
            VALUES ($1,$2,$3,$4,$5,$6,$7)
            "#,
        )
        .bind(redemption.id)
        .bind(redemption.item_id)
        .bind(redemption.user_id)
        .bind(redemption.status.as_str())
        .bind(redemption.verified_at)
        .bind(redemption.expires_at)
        .bind(redemption.confirmed_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> GachaResult<Option<Redemption>> {
        let row = sqlx::query(
            "SELECT id, item_id, user_id, status, verified_at, expires_at, confirmed_at FROM redemptions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.as_ref().map(redemption_from_row).transpose()
    }

    async fn update(&self, redemption: &Redemption) -> GachaResult<()> {
        sqlx::query(
            "UPDATE redemptions SET status = $1, confirmed_at = $2 WHERE id = $3",
        )
        .bind(redemption.status.as_str())
        .bind(redemption.confirmed_at)
        .bind(redemption.id)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn list_overdue(&self, now: DateTime<Utc>) -> GachaResult<Vec<Redemption>> {
        let rows = sqlx::query(
            "SELECT id, item_id, user_id, status, verified_at, expires_at, confirmed_at FROM redemptions WHERE status = 'VERIFIED' AND expires_at < $1",
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.iter().map(redemption_from_row).collect()
    }
}
