pub mod locale;
pub mod models;
pub mod pii;
pub mod reward;

pub use locale::Locale;
pub use pii::Masked;
pub use reward::RewardTier;
