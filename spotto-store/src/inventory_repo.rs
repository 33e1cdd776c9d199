use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use spotto_core::{GachaError, GachaResult};
use spotto_inventory::{InventoryItem, ItemState, InventoryRepository};
use spotto_shared::RewardTier;

use crate::store_err;

pub struct PgInventoryRepository {
    pub pool: PgPool,
}

impl PgInventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn item_from_row(row: &sqlx::postgres::PgRow) -> GachaResult<InventoryItem> {
    let tier: String = row.try_get("tier").map_err(store_err)?;
    let state: String = row.try_get("state").map_err(store_err)?;
    Ok(InventoryItem {
        id: row.try_get("id").map_err(store_err)?,
        user_id: row.try_get("user_id").map_err(store_err)?,
        slot_index: row.try_get("slot_index").map_err(store_err)?,
        tier: RewardTier::parse(&tier)
            .ok_or_else(|| GachaError::Store(format!("unknown reward tier: {}", tier)))?,
        coupon_id: row.try_get("coupon_id").map_err(store_err)?,
        merchant_id: row.try_get("merchant_id").map_err(store_err)?,
        is_read: row.try_get("is_read").map_err(store_err)?,
        state: ItemState::parse(&state)
            .ok_or_else(|| GachaError::Store(format!("unknown item state: {}", state)))?,
        valid_until: row.try_get("valid_until").map_err(store_err)?,
        created_at: row.try_get("created_at").map_err(store_err)?,
        updated_at: row.try_get("updated_at").map_err(store_err)?,
    })
}

const ITEM_COLUMNS: &str = "id, user_id, slot_index, tier, coupon_id, merchant_id, is_read, state, valid_until, created_at, updated_at";

#[async_trait]
impl InventoryRepository for PgInventoryRepository {
    async fn try_insert(&self, item: &InventoryItem) -> GachaResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO inventory_items (
                id, user_id, slot_index, tier, coupon_id, merchant_id,
                is_read, state, valid_until, created_at, updated_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
            "#,
        )
        .bind(item.id)
        .bind(item.user_id)
        .bind(item.slot_index)
        .bind(item.tier.as_str())
        .bind(item.coupon_id)
        .bind(item.merchant_id)
        .bind(item.is_read)
        .bind(item.state.as_str())
        .bind(item.valid_until)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(true),
            // The partial unique index on (user_id, slot_index) turns a slot
            // race into a violation; the manager retries with the next gap.
            Err(err) if is_unique_violation(&err) => Ok(false),
            Err(err) => Err(store_err(err)),
        }
    }

    async fn get(&self, item_id: Uuid) -> GachaResult<Option<InventoryItem>> {
        let row = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = $1"
        ))
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.as_ref().map(item_from_row).transpose()
    }

    async fn occupied_slots(&self, user_id: Uuid) -> GachaResult<Vec<i32>> {
        let rows = sqlx::query(
            "SELECT slot_index FROM inventory_items WHERE user_id = $1 AND state <> 'DELETED'",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.iter()
            .map(|row| row.try_get("slot_index").map_err(store_err))
            .collect()
    }

    async fn list_for_user(&self, user_id: Uuid) -> GachaResult<Vec<InventoryItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE user_id = $1 AND state <> 'DELETED' ORDER BY slot_index ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.iter().map(item_from_row).collect()
    }

    async fn update(&self, item: &InventoryItem) -> GachaResult<()> {
        sqlx::query(
            r#"
            UPDATE inventory_items
            SET is_read = $1, state = $2, valid_until = $3, updated_at = $4
            WHERE id = $5
            "#,
        )
        .bind(item.is_read)
        .bind(item.state.as_str())
        .bind(item.valid_until)
        .bind(item.updated_at)
        .bind(item.id)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn unread_count(&self, user_id: Uuid) -> GachaResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS unread FROM inventory_items WHERE user_id = $1 AND state <> 'DELETED' AND NOT is_read",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;

        row.try_get("unread").map_err(store_err)
    }

    async fn list_expiring_before(
        &self,
        user_id: Uuid,
        before: DateTime<Utc>,
    ) -> GachaResult<Vec<InventoryItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items WHERE user_id = $1 AND state <> 'DELETED' AND valid_until IS NOT NULL AND valid_until <= $2 ORDER BY valid_until ASC"
        ))
        .bind(user_id)
        .bind(before)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.iter().map(item_from_row).collect()
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
