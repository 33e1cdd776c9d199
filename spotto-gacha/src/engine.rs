use std::sync::Arc;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};
use uuid::Uuid;

use spotto_catalog::{CouponRepository, Place};
use spotto_core::{GachaResult, NotificationSink};
use spotto_inventory::{InventoryItem, InventoryManager, QuotaTracker, RewardPayload};
use spotto_shared::models::events::{RewardAdmittedEvent, TripPublishedEvent};
use spotto_shared::{Locale, RewardTier};

use crate::models::DrawSession;
use crate::rarity::RarityRoller;
use crate::repository::DrawSessionRepository;
use crate::selector::DrawSelector;
use crate::trips::TripPublisher;

/// Everything a single draw produced. `reward_lost` distinguishes "won a
/// tier but the inventory was full" from "won nothing".
#[derive(Debug, Clone)]
pub struct DrawOutcome {
    pub session_id: Uuid,
    pub places: Vec<Place>,
    pub shortfall: bool,
    pub won_tier: Option<RewardTier>,
    pub reward: Option<InventoryItem>,
    pub reward_lost: bool,
    pub published_trip: Option<i64>,
}

/// The draw pipeline. Stage order is fixed: quota admission, candidate
/// selection, rarity roll, inventory admission, trip publication. A store
/// fault after admission hands the consumed quota back before surfacing the
/// retryable error.
pub struct DrawEngine {
    selector: DrawSelector,
    roller: RarityRoller,
    quota: QuotaTracker,
    inventory: InventoryManager,
    trips: TripPublisher,
    coupons: Arc<dyn CouponRepository>,
    sessions: Arc<dyn DrawSessionRepository>,
    notify: Arc<dyn NotificationSink>,
}

impl DrawEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        selector: DrawSelector,
        roller: RarityRoller,
        quota: QuotaTracker,
        inventory: InventoryManager,
        trips: TripPublisher,
        coupons: Arc<dyn CouponRepository>,
        sessions: Arc<dyn DrawSessionRepository>,
        notify: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            selector,
            roller,
            quota,
            inventory,
            trips,
            coupons,
            sessions,
            notify,
        }
    }

    pub async fn draw(&self, user_id: Uuid, locale: &Locale, count: usize) -> GachaResult<DrawOutcome> {
        self.quota.admit_draw(user_id).await?;

        match self.run_draw(user_id, locale, count).await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                if err.is_retryable() {
                    warn!(user_id = %user_id, error = %err, "draw failed mid-flight, returning quota");
                    self.quota.compensate(user_id).await;
                }
                Err(err)
            }
        }
    }

    async fn run_draw(
        &self,
        user_id: Uuid,
        locale: &Locale,
        count: usize,
    ) -> GachaResult<DrawOutcome> {
        let mut rng = StdRng::from_entropy();

        let selection = self
            .selector
            .select_candidates(user_id, locale, count, &mut rng)
            .await?;
        let won_tier = self.roller.roll(&mut rng).await?;

        let mut reward = None;
        let mut reward_lost = false;
        if let Some(tier) = won_tier {
            let payload = self.pick_coupon(tier, &mut rng).await?;
            match self.inventory.admit(user_id, payload).await? {
                Some(item) => {
                    self.notify
                        .reward_admitted(RewardAdmittedEvent {
                            user_id,
                            item_id: item.id,
                            slot_index: item.slot_index,
                            tier: item.tier,
                            timestamp: Utc::now().timestamp(),
                        })
                        .await;
                    reward = Some(item);
                }
                None => reward_lost = true,
            }
        }

        let session = DrawSession::new(
            user_id,
            locale.clone(),
            count,
            selection.places.iter().map(|p| p.id).collect(),
            selection.shortfall,
        );
        self.sessions.insert(&session).await?;

        let mut published_trip = None;
        if self.trips.should_publish(locale, &session.place_ids).await? {
            let trip = self.trips.publish(locale, session.place_ids.clone()).await?;
            self.sessions.set_published(session.id).await?;
            self.notify
                .trip_published(TripPublishedEvent {
                    trip_id: trip.id,
                    city_key: trip.city_key.clone(),
                    place_count: trip.place_ids.len(),
                    timestamp: Utc::now().timestamp(),
                })
                .await;
            published_trip = Some(trip.id);
        }

        info!(
            user_id = %user_id,
            session_id = %session.id,
            places = session.place_ids.len(),
            tier = ?won_tier,
            reward_lost,
            "draw completed"
        );
        Ok(DrawOutcome {
            session_id: session.id,
            places: selection.places,
            shortfall: selection.shortfall,
            won_tier,
            reward,
            reward_lost,
            published_trip,
        })
    }

    /// Attach a coupon of the won tier when stock allows; a tier with no
    /// available coupon still yields a (never-redeemable) reward entry.
    async fn pick_coupon<R: Rng + Send>(
        &self,
        tier: RewardTier,
        rng: &mut R,
    ) -> GachaResult<RewardPayload> {
        let now = Utc::now();
        let candidates: Vec<_> = self
            .coupons
            .list_active_for_tier(tier)
            .await?
            .into_iter()
            .filter(|c| c.is_available(now))
            .collect();

        Ok(match candidates.choose(rng) {
            Some(coupon) => RewardPayload {
                tier,
                coupon_id: Some(coupon.id),
                merchant_id: Some(coupon.merchant_id),
                valid_until: coupon.valid_until,
            },
            None => RewardPayload::tier_only(tier),
        })
    }
}
