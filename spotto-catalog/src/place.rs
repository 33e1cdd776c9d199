use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spotto_shared::Locale;

/// Place categories in the catalog
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlaceCategory {
    Scenic,
    Cultural,
    Food,
    Shopping,
    Activity,
    Entertainment,
    Lodging,
}

impl PlaceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceCategory::Scenic => "SCENIC",
            PlaceCategory::Cultural => "CULTURAL",
            PlaceCategory::Food => "FOOD",
            PlaceCategory::Shopping => "SHOPPING",
            PlaceCategory::Activity => "ACTIVITY",
            PlaceCategory::Entertainment => "ENTERTAINMENT",
            PlaceCategory::Lodging => "LODGING",
        }
    }

    pub fn parse(s: &str) -> Option<PlaceCategory> {
        match s {
            "SCENIC" => Some(PlaceCategory::Scenic),
            "CULTURAL" => Some(PlaceCategory::Cultural),
            "FOOD" => Some(PlaceCategory::Food),
            "SHOPPING" => Some(PlaceCategory::Shopping),
            "ACTIVITY" => Some(PlaceCategory::Activity),
            "ENTERTAINMENT" => Some(PlaceCategory::Entertainment),
            "LODGING" => Some(PlaceCategory::Lodging),
            _ => None,
        }
    }
}

/// Immutable reference data produced by the catalog collaborator; the draw
/// engine only ever reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub id: Uuid,
    pub external_id: Option<String>,
    pub name: String,
    pub locale: Locale,
    pub category: PlaceCategory,
    pub rating: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub photo_url: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
}

impl Place {
    pub fn has_coordinates(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }
}
