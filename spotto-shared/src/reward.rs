use serde::{Deserialize, Serialize};

/// Reward rarity tier. A roll that lands outside every configured weight
/// band produces no tier at all (`Option<RewardTier>` = None).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RewardTier {
    R,
    S,
    Sr,
    Ssr,
    Sp,
}

impl RewardTier {
    /// Fixed walk order for the cumulative-weight roll: rarest first.
    pub const PRIORITY: [RewardTier; 5] = [
        RewardTier::Sp,
        RewardTier::Ssr,
        RewardTier::Sr,
        RewardTier::S,
        RewardTier::R,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RewardTier::R => "R",
            RewardTier::S => "S",
            RewardTier::Sr => "SR",
            RewardTier::Ssr => "SSR",
            RewardTier::Sp => "SP",
        }
    }

    pub fn parse(s: &str) -> Option<RewardTier> {
        match s {
            "R" => Some(RewardTier::R),
            "S" => Some(RewardTier::S),
            "SR" => Some(RewardTier::Sr),
            "SSR" => Some(RewardTier::Ssr),
            "SP" => Some(RewardTier::Sp),
            _ => None,
        }
    }
}

impl std::fmt::Display for RewardTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
