use async_trait::async_trait;
use uuid::Uuid;

use spotto_core::GachaResult;
use spotto_shared::{Locale, RewardTier};

use crate::coupon::Coupon;
use crate::place::Place;

/// Read-only access to the place catalog collaborator.
#[async_trait]
pub trait PlaceRepository: Send + Sync {
    /// Active places for a locale; district targeting narrows the set when
    /// the locale carries one.
    async fn list_active(&self, locale: &Locale) -> GachaResult<Vec<Place>>;

    async fn find_by_external_id(&self, external_id: &str) -> GachaResult<Option<Place>>;
}

/// Coupon catalog collaborator. Stock bookkeeping stays on its side; the
/// engine only asks for candidates and reports a single consumption.
#[async_trait]
pub trait CouponRepository: Send + Sync {
    async fn list_active(&self, merchant_id: Uuid) -> GachaResult<Vec<Coupon>>;

    async fn list_active_for_tier(&self, tier: RewardTier) -> GachaResult<Vec<Coupon>>;

    async fn get(&self, coupon_id: Uuid) -> GachaResult<Option<Coupon>>;

    async fn decrement_remaining(&self, coupon_id: Uuid) -> GachaResult<()>;
}
