use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{error, info};
use uuid::Uuid;

use spotto_catalog::CouponRepository;
use spotto_core::config::keys;
use spotto_core::{ConfigService, GachaError, GachaResult};

use crate::models::{
    InventoryItem, ItemState, Redemption, RedemptionCode, RedemptionStatus, DEFAULT_GRACE_MINUTES,
};
use crate::repository::{InventoryRepository, RedemptionRepository};

/// Two-phase in-person redemption: `verify` checks the merchant's
/// day-scoped code and consumes the item on the spot, opening a grace
/// window; `confirm` settles it; `expire_overdue` force-closes windows the
/// merchant never confirmed. The item is never un-redeemed by a timeout.
pub struct RedemptionProtocol {
    items: Arc<dyn InventoryRepository>,
    redemptions: Arc<dyn RedemptionRepository>,
    coupons: Arc<dyn CouponRepository>,
    config: Arc<ConfigService>,
}

impl RedemptionProtocol {
    pub fn new(
        items: Arc<dyn InventoryRepository>,
        redemptions: Arc<dyn RedemptionRepository>,
        coupons: Arc<dyn CouponRepository>,
        config: Arc<ConfigService>,
    ) -> Self {
        Self {
            items,
            redemptions,
            coupons,
            config,
        }
    }

    /// Replace the merchant's active code. The previous code stops working
    /// the moment this returns.
    pub async fn issue_code(&self, merchant_id: Uuid, code: String) -> GachaResult<RedemptionCode> {
        let code = code.trim().to_string();
        if code.is_empty() {
            return Err(GachaError::InvalidConfig(
                "merchant code must not be empty".to_string(),
            ));
        }
        let record = RedemptionCode::new(merchant_id, code);
        self.redemptions.put_merchant_code(&record).await?;
        info!(merchant_id = %merchant_id, "merchant redemption code issued");
        Ok(record)
    }

    /// Phase one. Every guard reports its own taxonomy entry so the caller
    /// can render a precise message.
    pub async fn verify(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        supplied_code: &str,
    ) -> GachaResult<(InventoryItem, Redemption)> {
        let now = Utc::now();
        let mut item = self.redeemable_item(user_id, item_id, now).await?;

        let merchant_id = item.merchant_id.ok_or(GachaError::NoMerchantLink)?;
        let code = self
            .redemptions
            .get_merchant_code(merchant_id)
            .await?
            .ok_or(GachaError::NoMerchantCodeSet)?;
        if code.is_stale(now) {
            return Err(GachaError::MerchantCodeExpired);
        }
        if !code.matches(supplied_code) {
            return Err(GachaError::InvalidCode);
        }

        // The item is consumed at the earliest possible moment so a racing
        // second verify lands on AlreadyRedeemed.
        item.set_state(ItemState::Redeemed);
        self.items.update(&item).await?;

        if let Some(coupon_id) = item.coupon_id {
            // Merchant-side stock bookkeeping. The item is already consumed;
            // a counter fault must not reopen the reuse window.
            if let Err(err) = self.coupons.decrement_remaining(coupon_id).await {
                error!(coupon_id = %coupon_id, error = %err, "coupon stock decrement failed");
            }
        }

        let grace = Duration::minutes(
            self.config
                .get_i64(keys::CATEGORY_REDEMPTION, keys::GRACE_MINUTES, DEFAULT_GRACE_MINUTES)
                .await?,
        );
        let redemption = Redemption::new(item.id, user_id, now, grace);
        self.redemptions.insert(&redemption).await?;
        info!(item_id = %item.id, redemption_id = %redemption.id, "redemption verified");
        Ok((item, redemption))
    }

    /// Phase two: the merchant's final acknowledgement. Idempotent; a
    /// repeated confirm of a settled redemption is a no-op.
    pub async fn confirm(&self, user_id: Uuid, redemption_id: Uuid) -> GachaResult<Redemption> {
        let mut redemption = match self.redemptions.get(redemption_id).await? {
            Some(r) if r.user_id == user_id => r,
            _ => return Err(GachaError::ItemNotFound),
        };

        match redemption.status {
            RedemptionStatus::Confirmed => Ok(redemption),
            RedemptionStatus::Expired => Err(GachaError::ItemExpired),
            RedemptionStatus::Verified => {
                let now = Utc::now();
                if now > redemption.expires_at {
                    redemption.status = RedemptionStatus::Expired;
                    self.redemptions.update(&redemption).await?;
                    return Err(GachaError::ItemExpired);
                }
                redemption.status = RedemptionStatus::Confirmed;
                redemption.confirmed_at = Some(now);
                self.redemptions.update(&redemption).await?;
                Ok(redemption)
            }
        }
    }

    /// Sweep verified redemptions past their grace deadline. The linked
    /// item stays redeemed; the window just closes.
    pub async fn expire_overdue(&self, now: DateTime<Utc>) -> GachaResult<usize> {
        let overdue = self.redemptions.list_overdue(now).await?;
        let mut closed = 0;
        for mut redemption in overdue {
            redemption.status = RedemptionStatus::Expired;
            self.redemptions.update(&redemption).await?;

            if let Some(mut item) = self.items.get(redemption.item_id).await? {
                if item.is_active() {
                    item.set_state(ItemState::Redeemed);
                    self.items.update(&item).await?;
                }
            }
            closed += 1;
        }
        if closed > 0 {
            info!(closed, "force-closed overdue redemptions");
        }
        Ok(closed)
    }

    async fn redeemable_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        now: DateTime<Utc>,
    ) -> GachaResult<InventoryItem> {
        let mut item = match self.items.get(item_id).await? {
            Some(item) if item.user_id == user_id && item.state != ItemState::Deleted => item,
            _ => return Err(GachaError::ItemNotFound),
        };
        match item.state {
            ItemState::Redeemed => Err(GachaError::AlreadyRedeemed),
            ItemState::Expired => Err(GachaError::ItemExpired),
            ItemState::Active => {
                if item.is_lapsed(now) {
                    item.set_state(ItemState::Expired);
                    self.items.update(&item).await?;
                    return Err(GachaError::ItemExpired);
                }
                Ok(item)
            }
            ItemState::Deleted => Err(GachaError::ItemNotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RewardPayload;
    use crate::testutil::{
        CountingCouponRepository, MemoryInventoryRepository, MemoryRedemptionRepository,
    };
    use spotto_catalog::Coupon;
    use spotto_core::ConfigStore;
    use spotto_shared::RewardTier;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    struct MapConfigStore(Mutex<HashMap<(String, String), serde_json::Value>>);

    #[async_trait::async_trait]
    impl ConfigStore for MapConfigStore {
        async fn get(&self, category: &str, key: &str) -> GachaResult<Option<serde_json::Value>> {
            Ok(self.0.lock().await.get(&(category.to_string(), key.to_string())).cloned())
        }

        async fn set(&self, category: &str, key: &str, value: serde_json::Value) -> GachaResult<()> {
            self.0.lock().await.insert((category.to_string(), key.to_string()), value);
            Ok(())
        }
    }

    struct Fixture {
        protocol: RedemptionProtocol,
        items: Arc<MemoryInventoryRepository>,
        redemptions: Arc<MemoryRedemptionRepository>,
        coupons: Arc<CountingCouponRepository>,
        merchant_id: Uuid,
        coupon_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let merchant_id = Uuid::new_v4();
        let coupon = Coupon {
            id: Uuid::new_v4(),
            merchant_id,
            title: "Half-price ramen".to_string(),
            tier: RewardTier::Sr,
            valid_from: None,
            valid_until: None,
            remaining: Some(10),
            is_active: true,
        };
        let coupon_id = coupon.id;

        let items = Arc::new(MemoryInventoryRepository::default());
        let redemptions = Arc::new(MemoryRedemptionRepository::default());
        let coupons = Arc::new(CountingCouponRepository::with_coupon(coupon));
        let config = Arc::new(ConfigService::new(Arc::new(MapConfigStore(Mutex::new(
            HashMap::new(),
        )))));

        Fixture {
            protocol: RedemptionProtocol::new(
                items.clone(),
                redemptions.clone(),
                coupons.clone(),
                config,
            ),
            items,
            redemptions,
            coupons,
            merchant_id,
            coupon_id,
        }
    }

    async fn admit_item(fx: &Fixture, user: Uuid) -> InventoryItem {
        let item = InventoryItem::new(
            user,
            0,
            RewardPayload {
                tier: RewardTier::Sr,
                coupon_id: Some(fx.coupon_id),
                merchant_id: Some(fx.merchant_id),
                valid_until: None,
            },
        );
        assert!(fx.items.try_insert(&item).await.unwrap());
        item
    }

    #[tokio::test]
    async fn test_verify_happy_path_consumes_item_once() {
        let fx = fixture().await;
        let user = Uuid::new_v4();
        let item = admit_item(&fx, user).await;

        fx.protocol.issue_code(fx.merchant_id, "RAMEN-77".to_string()).await.unwrap();
        let (redeemed, redemption) = fx.protocol.verify(user, item.id, "ramen-77").await.unwrap();

        assert_eq!(redeemed.state, ItemState::Redeemed);
        assert_eq!(redemption.status, RedemptionStatus::Verified);
        assert_eq!(redemption.expires_at, redemption.verified_at + Duration::minutes(3));
        assert_eq!(fx.coupons.decrement_count(), 1);

        // Second attempt hits the consumed item, not the counter.
        let err = fx.protocol.verify(user, item.id, "ramen-77").await.unwrap_err();
        assert!(matches!(err, GachaError::AlreadyRedeemed));
        assert_eq!(fx.coupons.decrement_count(), 1);
    }

    #[tokio::test]
    async fn test_verify_guards_report_taxonomy() {
        let fx = fixture().await;
        let user = Uuid::new_v4();
        let item = admit_item(&fx, user).await;

        // No code issued yet.
        let err = fx.protocol.verify(user, item.id, "anything").await.unwrap_err();
        assert!(matches!(err, GachaError::NoMerchantCodeSet));

        fx.protocol.issue_code(fx.merchant_id, "RAMEN-77".to_string()).await.unwrap();

        // Wrong code.
        let err = fx.protocol.verify(user, item.id, "udon-12").await.unwrap_err();
        assert!(matches!(err, GachaError::InvalidCode));

        // Someone else's item is indistinguishable from no item.
        let err = fx
            .protocol
            .verify(Uuid::new_v4(), item.id, "ramen-77")
            .await
            .unwrap_err();
        assert!(matches!(err, GachaError::ItemNotFound));

        // No merchant link.
        let orphan = InventoryItem::new(user, 1, RewardPayload::tier_only(RewardTier::R));
        fx.items.try_insert(&orphan).await.unwrap();
        let err = fx.protocol.verify(user, orphan.id, "ramen-77").await.unwrap_err();
        assert!(matches!(err, GachaError::NoMerchantLink));
    }

    #[tokio::test]
    async fn test_yesterdays_code_is_stale_even_if_unused() {
        let fx = fixture().await;
        let user = Uuid::new_v4();
        let item = admit_item(&fx, user).await;

        let mut code = RedemptionCode::new(fx.merchant_id, "RAMEN-77".to_string());
        code.issued_at = Utc::now() - Duration::days(2);
        fx.redemptions.put_merchant_code(&code).await.unwrap();

        let err = fx.protocol.verify(user, item.id, "ramen-77").await.unwrap_err();
        assert!(matches!(err, GachaError::MerchantCodeExpired));
    }

    #[tokio::test]
    async fn test_reissue_replaces_previous_code() {
        let fx = fixture().await;
        let user = Uuid::new_v4();
        let item = admit_item(&fx, user).await;

        fx.protocol.issue_code(fx.merchant_id, "MORNING".to_string()).await.unwrap();
        fx.protocol.issue_code(fx.merchant_id, "EVENING".to_string()).await.unwrap();

        let err = fx.protocol.verify(user, item.id, "morning").await.unwrap_err();
        assert!(matches!(err, GachaError::InvalidCode));
        fx.protocol.verify(user, item.id, "evening").await.unwrap();
    }

    #[tokio::test]
    async fn test_lapsed_item_expires_on_touch() {
        let fx = fixture().await;
        let user = Uuid::new_v4();

        let mut item = InventoryItem::new(
            user,
            0,
            RewardPayload {
                tier: RewardTier::R,
                coupon_id: Some(fx.coupon_id),
                merchant_id: Some(fx.merchant_id),
                valid_until: Some(Utc::now() - Duration::days(1)),
            },
        );
        fx.items.try_insert(&item).await.unwrap();
        fx.protocol.issue_code(fx.merchant_id, "X".to_string()).await.unwrap();

        let err = fx.protocol.verify(user, item.id, "x").await.unwrap_err();
        assert!(matches!(err, GachaError::ItemExpired));

        item = fx.items.get(item.id).await.unwrap().unwrap();
        assert_eq!(item.state, ItemState::Expired);
        assert_eq!(fx.coupons.decrement_count(), 0);
    }

    #[tokio::test]
    async fn test_confirm_is_idempotent() {
        let fx = fixture().await;
        let user = Uuid::new_v4();
        let item = admit_item(&fx, user).await;

        fx.protocol.issue_code(fx.merchant_id, "OK".to_string()).await.unwrap();
        let (_, redemption) = fx.protocol.verify(user, item.id, "ok").await.unwrap();

        let first = fx.protocol.confirm(user, redemption.id).await.unwrap();
        assert_eq!(first.status, RedemptionStatus::Confirmed);
        let second = fx.protocol.confirm(user, redemption.id).await.unwrap();
        assert_eq!(second.status, RedemptionStatus::Confirmed);
        assert_eq!(first.confirmed_at, second.confirmed_at);
        assert_eq!(fx.coupons.decrement_count(), 1);
    }

    #[tokio::test]
    async fn test_overdue_sweep_closes_window_and_keeps_item_redeemed() {
        let fx = fixture().await;
        let user = Uuid::new_v4();
        let item = admit_item(&fx, user).await;

        fx.protocol.issue_code(fx.merchant_id, "OK".to_string()).await.unwrap();
        let (_, redemption) = fx.protocol.verify(user, item.id, "ok").await.unwrap();

        let after_deadline = redemption.expires_at + Duration::seconds(1);
        let closed = fx.protocol.expire_overdue(after_deadline).await.unwrap();
        assert_eq!(closed, 1);

        let swept = fx.redemptions.get(redemption.id).await.unwrap().unwrap();
        assert_eq!(swept.status, RedemptionStatus::Expired);
        let item = fx.items.get(item.id).await.unwrap().unwrap();
        assert_eq!(item.state, ItemState::Redeemed);

        // Confirming a swept redemption reports expiry.
        let err = fx.protocol.confirm(user, redemption.id).await.unwrap_err();
        assert!(matches!(err, GachaError::ItemExpired));
    }

    #[tokio::test]
    async fn test_empty_code_rejected_at_issuance() {
        let fx = fixture().await;
        let err = fx.protocol.issue_code(fx.merchant_id, "   ".to_string()).await.unwrap_err();
        assert!(matches!(err, GachaError::InvalidConfig(_)));
    }
}
