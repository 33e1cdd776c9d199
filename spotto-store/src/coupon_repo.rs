use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use spotto_catalog::{Coupon, CouponRepository};
use spotto_core::{GachaError, GachaResult};
use spotto_shared::RewardTier;

use crate::store_err;

pub struct PgCouponRepository {
    pool: PgPool,
}

impl PgCouponRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CouponRow {
    id: Uuid,
    merchant_id: Uuid,
    title: String,
    tier: String,
    valid_from: Option<chrono::DateTime<chrono::Utc>>,
    valid_until: Option<chrono::DateTime<chrono::Utc>>,
    remaining: Option<i64>,
    is_active: bool,
}

impl CouponRow {
    fn into_coupon(self) -> GachaResult<Coupon> {
        let tier = RewardTier::parse(&self.tier)
            .ok_or_else(|| GachaError::Store(format!("unknown coupon tier: {}", self.tier)))?;
        Ok(Coupon {
            id: self.id,
            merchant_id: self.merchant_id,
            title: self.title,
            tier,
            valid_from: self.valid_from,
            valid_until: self.valid_until,
            remaining: self.remaining,
            is_active: self.is_active,
        })
    }
}

const COUPON_COLUMNS: &str =
    "id, merchant_id, title, tier, valid_from, valid_until, remaining, is_active";

#[async_trait]
impl CouponRepository for PgCouponRepository {
    async fn list_active(&self, merchant_id: Uuid) -> GachaResult<Vec<Coupon>> {
        let rows: Vec<CouponRow> = sqlx::query_as(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons WHERE is_active AND merchant_id = $1"
        ))
        .bind(merchant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.into_iter().map(CouponRow::into_coupon).collect()
    }

    async fn list_active_for_tier(&self, tier: RewardTier) -> GachaResult<Vec<Coupon>> {
        let rows: Vec<CouponRow> = sqlx::query_as(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons WHERE is_active AND tier = $1"
        ))
        .bind(tier.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.into_iter().map(CouponRow::into_coupon).collect()
    }

    async fn get(&self, coupon_id: Uuid) -> GachaResult<Option<Coupon>> {
        let row: Option<CouponRow> =
            sqlx::query_as(&format!("SELECT {COUPON_COLUMNS} FROM coupons WHERE id = $1"))
                .bind(coupon_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(store_err)?;

        row.map(CouponRow::into_coupon).transpose()
    }

    async fn decrement_remaining(&self, coupon_id: Uuid) -> GachaResult<()> {
        // NULL remaining means unlimited stock; never goes below zero.
        sqlx::query(
            "UPDATE coupons SET remaining = GREATEST(remaining - 1, 0) WHERE id = $1 AND remaining IS NOT NULL",
        )
        .bind(coupon_id)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }
}
