use async_trait::async_trait;
use tracing::info;

use spotto_shared::models::events::{ItemsExpiringEvent, RewardAdmittedEvent, TripPublishedEvent};

/// Outbound notification boundary. Delivery is fire-and-forget: implementors
/// swallow their own failures, and callers never let a sink error touch the
/// core transaction.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn reward_admitted(&self, event: RewardAdmittedEvent);
    async fn items_expiring(&self, event: ItemsExpiringEvent);
    async fn trip_published(&self, event: TripPublishedEvent);
}

/// Default sink: structured log lines only. Push/email delivery is an
/// external collaborator wired in at deployment time.
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn reward_admitted(&self, event: RewardAdmittedEvent) {
        info!(
            user_id = %event.user_id,
            item_id = %event.item_id,
            tier = %event.tier,
            "reward admitted to inventory"
        );
    }

    async fn items_expiring(&self, event: ItemsExpiringEvent) {
        info!(
            user_id = %event.user_id,
            count = event.item_ids.len(),
            days_ahead = event.days_ahead,
            "inventory items expiring soon"
        );
    }

    async fn trip_published(&self, event: TripPublishedEvent) {
        info!(trip_id = event.trip_id, city = %event.city_key, "trip published");
    }
}
