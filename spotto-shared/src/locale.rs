use serde::{Deserialize, Serialize};

/// Where a draw happens. District is the finest targeting unit; trip
/// deduplication is scoped to the city.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locale {
    pub country: String,
    pub city: String,
    pub district: Option<String>,
}

impl Locale {
    pub fn new(country: impl Into<String>, city: impl Into<String>, district: Option<String>) -> Self {
        Self {
            country: country.into(),
            city: city.into(),
            district,
        }
    }

    /// Key used wherever state is scoped per city (trip dedup, numbering).
    pub fn city_key(&self) -> String {
        format!("{}:{}", self.country, self.city)
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.district {
            Some(d) => write!(f, "{}/{}/{}", self.country, self.city, d),
            None => write!(f, "{}/{}", self.country, self.city),
        }
    }
}
