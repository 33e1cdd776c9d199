use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info};

use spotto_inventory::RedemptionProtocol;

/// Background sweep that force-closes verified redemptions whose grace
/// window lapsed without a merchant confirmation.
pub async fn start_redemption_sweeper(protocol: Arc<RedemptionProtocol>, interval_seconds: u64) {
    info!(interval_seconds, "redemption sweeper started");
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_seconds));
    loop {
        ticker.tick().await;
        match protocol.expire_overdue(Utc::now()).await {
            Ok(0) => {}
            Ok(closed) => info!(closed, "redemption sweep force-closed overdue windows"),
            Err(err) => error!("redemption sweep failed: {}", err),
        }
    }
}
