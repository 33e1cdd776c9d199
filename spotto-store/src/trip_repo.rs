use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use spotto_core::GachaResult;
use spotto_gacha::{PublishedTrip, TripRepository};

use crate::store_err;

pub struct PgTripRepository {
    pool: PgPool,
}

impl PgTripRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TripRepository for PgTripRepository {
    async fn insert(&self, city_key: &str, place_ids: &[Uuid]) -> GachaResult<PublishedTrip> {
        let row = sqlx::query(
            r#"
            INSERT INTO published_trips (city_key, place_ids)
            VALUES ($1, $2)
            RETURNING id, published_at
            "#,
        )
        .bind(city_key)
        .bind(place_ids)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(PublishedTrip {
            id: row.try_get("id").map_err(store_err)?,
            city_key: city_key.to_string(),
            place_ids: place_ids.to_vec(),
            published_at: row.try_get("published_at").map_err(store_err)?,
        })
    }

    async fn recent_place_sets(&self, city_key: &str, limit: i64) -> GachaResult<Vec<Vec<Uuid>>> {
        let rows = sqlx::query(
            "SELECT place_ids FROM published_trips WHERE city_key = $1 ORDER BY id DESC LIMIT $2",
        )
        .bind(city_key)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.iter()
            .map(|row| row.try_get("place_ids").map_err(store_err))
            .collect()
    }

    async fn count_published_upto(&self, city_key: &str, trip_id: i64) -> GachaResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM published_trips WHERE city_key = $1 AND id <= $2",
        )
        .bind(city_key)
        .bind(trip_id)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;

        row.try_get("n").map_err(store_err)
    }
}
