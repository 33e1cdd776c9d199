use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use spotto_catalog::{Place, PlaceCategory, PlaceRepository};
use spotto_core::{GachaError, GachaResult};
use spotto_shared::Locale;

use crate::store_err;

pub struct PgPlaceRepository {
    pool: PgPool,
}

impl PgPlaceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PlaceRow {
    id: Uuid,
    external_id: Option<String>,
    name: String,
    country: String,
    city: String,
    district: Option<String>,
    category: String,
    rating: f64,
    latitude: Option<f64>,
    longitude: Option<f64>,
    photo_url: Option<String>,
    description: Option<String>,
    is_active: bool,
}

impl PlaceRow {
    fn into_place(self) -> GachaResult<Place> {
        let category = PlaceCategory::parse(&self.category)
            .ok_or_else(|| GachaError::Store(format!("unknown place category: {}", self.category)))?;
        Ok(Place {
            id: self.id,
            external_id: self.external_id,
            name: self.name,
            locale: Locale::new(self.country, self.city, self.district),
            category,
            rating: self.rating,
            latitude: self.latitude,
            longitude: self.longitude,
            photo_url: self.photo_url,
            description: self.description,
            is_active: self.is_active,
        })
    }
}

const PLACE_COLUMNS: &str = "id, external_id, name, country, city, district, category, rating, latitude, longitude, photo_url, description, is_active";

#[async_trait]
impl PlaceRepository for PgPlaceRepository {
    async fn list_active(&self, locale: &Locale) -> GachaResult<Vec<Place>> {
        let rows: Vec<PlaceRow> = match &locale.district {
            Some(district) => {
                sqlx::query_as(&format!(
                    "SELECT {PLACE_COLUMNS} FROM places WHERE is_active AND country = $1 AND city = $2 AND district = $3"
                ))
                .bind(&locale.country)
                .bind(&locale.city)
                .bind(district)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {PLACE_COLUMNS} FROM places WHERE is_active AND country = $1 AND city = $2"
                ))
                .bind(&locale.country)
                .bind(&locale.city)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(store_err)?;

        rows.into_iter().map(PlaceRow::into_place).collect()
    }

    async fn find_by_external_id(&self, external_id: &str) -> GachaResult<Option<Place>> {
        let row: Option<PlaceRow> = sqlx::query_as(&format!(
            "SELECT {PLACE_COLUMNS} FROM places WHERE external_id = $1"
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.map(PlaceRow::into_place).transpose()
    }
}
