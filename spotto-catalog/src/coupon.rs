use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spotto_shared::RewardTier;

/// A merchant coupon that can ride along with a won draw. Stock and
/// lifecycle belong to the coupon catalog collaborator; the engine only
/// picks one and later asks for a single stock decrement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    pub id: Uuid,
    pub merchant_id: Uuid,
    pub title: String,
    pub tier: RewardTier,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub remaining: Option<i64>,
    pub is_active: bool,
}

impl Coupon {
    /// Whether the coupon may still be handed out (unlimited stock or > 0 left).
    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        if let Some(from) = self.valid_from {
            if now < from {
                return false;
            }
        }
        if let Some(until) = self.valid_until {
            if now > until {
                return false;
            }
        }
        match self.remaining {
            None => true,
            Some(left) => left > 0,
        }
    }
}
