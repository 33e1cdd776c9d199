use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spotto_shared::Locale;

/// One gacha invocation. Immutable once recorded, except the publish flag
/// set when the composition makes it onto the public trip feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub locale: Locale,
    pub requested_count: usize,
    pub place_ids: Vec<Uuid>,
    pub shortfall: bool,
    pub published: bool,
    pub created_at: DateTime<Utc>,
}

impl DrawSession {
    pub fn new(
        user_id: Uuid,
        locale: Locale,
        requested_count: usize,
        place_ids: Vec<Uuid>,
        shortfall: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            locale,
            requested_count,
            place_ids,
            shortfall,
            published: false,
            created_at: Utc::now(),
        }
    }
}
