use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use spotto_core::day;
use spotto_shared::{Masked, RewardTier};

/// Fixed inventory capacity per user.
pub const MAX_SLOTS: i32 = 200;

/// Grace window (minutes) between code verification and merchant
/// confirmation, unless overridden in configuration.
pub const DEFAULT_GRACE_MINUTES: i64 = 3;

/// Inventory item lifecycle. Items are never physically removed; `Deleted`
/// frees the slot while the row stays behind for audit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemState {
    Active,
    Redeemed,
    Expired,
    Deleted,
}

impl ItemState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemState::Active => "ACTIVE",
            ItemState::Redeemed => "REDEEMED",
            ItemState::Expired => "EXPIRED",
            ItemState::Deleted => "DELETED",
        }
    }

    pub fn parse(s: &str) -> Option<ItemState> {
        match s {
            "ACTIVE" => Some(ItemState::Active),
            "REDEEMED" => Some(ItemState::Redeemed),
            "EXPIRED" => Some(ItemState::Expired),
            "DELETED" => Some(ItemState::Deleted),
            _ => None,
        }
    }
}

/// What a winning roll deposits into a slot. The coupon/merchant link is
/// optional: a tier can be won while no coupon stock is available, and such
/// items are kept but can never be redeemed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardPayload {
    pub tier: RewardTier,
    pub coupon_id: Option<Uuid>,
    pub merchant_id: Option<Uuid>,
    pub valid_until: Option<DateTime<Utc>>,
}

impl RewardPayload {
    pub fn tier_only(tier: RewardTier) -> Self {
        Self {
            tier,
            coupon_id: None,
            merchant_id: None,
            valid_until: None,
        }
    }
}

/// One occupied inventory slot. Invariant: per user, non-deleted items
/// never share a slot index, enforced by the store's uniqueness constraint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub slot_index: i32,
    pub tier: RewardTier,
    pub coupon_id: Option<Uuid>,
    pub merchant_id: Option<Uuid>,
    pub is_read: bool,
    pub state: ItemState,
    pub valid_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn new(user_id: Uuid, slot_index: i32, payload: RewardPayload) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            slot_index,
            tier: payload.tier,
            coupon_id: payload.coupon_id,
            merchant_id: payload.merchant_id,
            is_read: false,
            state: ItemState::Active,
            valid_until: payload.valid_until,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == ItemState::Active
    }

    pub fn is_lapsed(&self, now: DateTime<Utc>) -> bool {
        matches!(self.valid_until, Some(until) if now > until)
    }

    pub fn set_state(&mut self, state: ItemState) {
        self.state = state;
        self.updated_at = Utc::now();
    }
}

/// Inventory usage snapshot exposed to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capacity {
    pub used: i32,
    pub max: i32,
    pub available: i32,
}

/// The merchant's current day-scoped secret. One active code per merchant;
/// issuing a new one replaces the old atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedemptionCode {
    pub merchant_id: Uuid,
    pub code: Masked<String>,
    pub issued_at: DateTime<Utc>,
}

impl RedemptionCode {
    pub fn new(merchant_id: Uuid, code: String) -> Self {
        Self {
            merchant_id,
            code: Masked(code),
            issued_at: Utc::now(),
        }
    }

    /// Codes compare case-insensitively: staff read them out loud.
    pub fn matches(&self, supplied: &str) -> bool {
        self.code.get().trim().eq_ignore_ascii_case(supplied.trim())
    }

    /// A code is only good on the local calendar day it was issued.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        !day::same_local_day(self.issued_at, now)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedemptionStatus {
    Verified,
    Confirmed,
    Expired,
}

impl RedemptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedemptionStatus::Verified => "VERIFIED",
            RedemptionStatus::Confirmed => "CONFIRMED",
            RedemptionStatus::Expired => "EXPIRED",
        }
    }

    pub fn parse(s: &str) -> Option<RedemptionStatus> {
        match s {
            "VERIFIED" => Some(RedemptionStatus::Verified),
            "CONFIRMED" => Some(RedemptionStatus::Confirmed),
            "EXPIRED" => Some(RedemptionStatus::Expired),
            _ => None,
        }
    }
}

/// A verified code check waiting for the merchant's final confirmation.
/// Invariant: `expires_at` is always `verified_at` plus the grace window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Redemption {
    pub id: Uuid,
    pub item_id: Uuid,
    pub user_id: Uuid,
    pub status: RedemptionStatus,
    pub verified_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl Redemption {
    pub fn new(item_id: Uuid, user_id: Uuid, verified_at: DateTime<Utc>, grace: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id,
            user_id,
            status: RedemptionStatus::Verified,
            verified_at,
            expires_at: verified_at + grace,
            confirmed_at: None,
        }
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == RedemptionStatus::Verified && now > self.expires_at
    }
}
