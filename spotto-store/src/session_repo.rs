use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use spotto_core::GachaResult;
use spotto_gacha::{DrawSession, DrawSessionRepository};
use spotto_shared::Locale;

use crate::store_err;

pub struct PgDrawSessionRepository {
    pool: PgPool,
}

impl PgDrawSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DrawSessionRepository for PgDrawSessionRepository {
    async fn insert(&self, session: &DrawSession) -> GachaResult<()> {
        sqlx::query(
            r#"
            INSERT INTO draw_sessions (id, user_id, country, city, district, requested_count, place_ids, shortfall, published, created_at)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
            "#,
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(&session.locale.country)
        .bind(&session.locale.city)
        .bind(session.locale.district.as_deref())
        .bind(session.requested_count as i32)
        .bind(&session.place_ids)
        .bind(session.shortfall)
        .bind(session.published)
        .bind(session.created_at)
        .execute(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(())
    }

    async fn set_published(&self, session_id: Uuid) -> GachaResult<()> {
        sqlx::query("UPDATE draw_sessions SET published = TRUE WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn get(&self, session_id: Uuid) -> GachaResult<Option<DrawSession>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, country, city, district, requested_count, place_ids, shortfall, published, created_at
            FROM draw_sessions WHERE id = $1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let country: String = row.try_get("country").map_err(store_err)?;
        let city: String = row.try_get("city").map_err(store_err)?;
        let district: Option<String> = row.try_get("district").map_err(store_err)?;
        let requested: i32 = row.try_get("requested_count").map_err(store_err)?;

        Ok(Some(DrawSession {
            id: row.try_get("id").map_err(store_err)?,
            user_id: row.try_get("user_id").map_err(store_err)?,
            locale: Locale::new(country, city, district),
            requested_count: requested as usize,
            place_ids: row.try_get("place_ids").map_err(store_err)?,
            shortfall: row.try_get("shortfall").map_err(store_err)?,
            published: row.try_get("published").map_err(store_err)?,
            created_at: row.try_get("created_at").map_err(store_err)?,
        }))
    }
}
