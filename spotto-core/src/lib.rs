pub mod config;
pub mod day;
pub mod notify;

pub use config::{ConfigService, ConfigStore};
pub use notify::NotificationSink;

/// The reward/redemption error taxonomy. Resource-exhaustion outcomes
/// (inventory full, candidate shortfall) are NOT errors and are surfaced as
/// structured results instead.
#[derive(Debug, thiserror::Error)]
pub enum GachaError {
    #[error("Daily draw quota exceeded")]
    QuotaExceeded,
    #[error("Inventory item not found")]
    ItemNotFound,
    #[error("Reward already redeemed")]
    AlreadyRedeemed,
    #[error("Reward expired")]
    ItemExpired,
    #[error("Merchant has not set a redemption code")]
    NoMerchantCodeSet,
    #[error("Merchant redemption code is stale")]
    MerchantCodeExpired,
    #[error("Redemption code does not match")]
    InvalidCode,
    #[error("Reward is not linked to a redeemable merchant")]
    NoMerchantLink,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Store unavailable: {0}")]
    Store(String),
}

impl GachaError {
    /// Stable machine-readable code exposed to API callers.
    pub fn code(&self) -> &'static str {
        match self {
            GachaError::QuotaExceeded => "QUOTA_EXCEEDED",
            GachaError::ItemNotFound => "ITEM_NOT_FOUND",
            GachaError::AlreadyRedeemed => "ALREADY_REDEEMED",
            GachaError::ItemExpired => "ITEM_EXPIRED",
            GachaError::NoMerchantCodeSet => "NO_MERCHANT_CODE_SET",
            GachaError::MerchantCodeExpired => "MERCHANT_CODE_EXPIRED",
            GachaError::InvalidCode => "INVALID_CODE",
            GachaError::NoMerchantLink => "NO_MERCHANT_LINK",
            GachaError::InvalidConfig(_) => "INVALID_CONFIG",
            GachaError::Store(_) => "STORE_UNAVAILABLE",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, GachaError::Store(_))
    }
}

pub type GachaResult<T> = Result<T, GachaError>;
