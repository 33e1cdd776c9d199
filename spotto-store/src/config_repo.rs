use async_trait::async_trait;
use sqlx::{PgPool, Row};

use spotto_core::{ConfigStore, GachaResult};

use crate::store_err;

/// Key/value configuration persisted in Postgres; the in-process cache on
/// top of this lives in [`spotto_core::ConfigService`].
pub struct PgConfigStore {
    pool: PgPool,
}

impl PgConfigStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConfigStore for PgConfigStore {
    async fn get(&self, category: &str, key: &str) -> GachaResult<Option<serde_json::Value>> {
        let row = sqlx::query(
            "SELECT config_value FROM app_config WHERE category = $1 AND config_key = $2",
        )
        .bind(category)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.map(|r| r.try_get("config_value").map_err(store_err))
            .transpose()
    }

    async fn set(&self, category: &str, key: &str, value: serde_json::Value) -> GachaResult<()> {
        sqlx::query(
            r#"
            INSERT INTO app_config (category, config_key, config_value, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (category, config_key)
            DO UPDATE SET config_value = EXCLUDED.config_value, updated_at = NOW()
            "#,
        )
        .bind(category)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }
}
