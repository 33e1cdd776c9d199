use std::sync::Arc;

use rand::Rng;
use serde_json::Value;

use spotto_core::config::keys;
use spotto_core::{ConfigService, GachaError, GachaResult};
use spotto_shared::RewardTier;

/// Default probability table (percent). The remainder up to 100 is the
/// no-reward band.
const DEFAULT_WEIGHTS: [(RewardTier, f64); 5] = [
    (RewardTier::Sp, 2.0),
    (RewardTier::Ssr, 8.0),
    (RewardTier::Sr, 15.0),
    (RewardTier::S, 23.0),
    (RewardTier::R, 32.0),
];

/// Validated weight table in fixed walk order (rarest first).
#[derive(Debug, Clone)]
pub struct WeightTable {
    weights: Vec<(RewardTier, f64)>,
}

impl WeightTable {
    pub fn default_table() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS.to_vec(),
        }
    }

    /// Parse an admin-supplied `{"SP": 2, "SSR": 8, ...}` object. A tier
    /// missing from the object gets weight 0.
    pub fn from_value(value: &Value) -> GachaResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| GachaError::InvalidConfig("rarity weights must be an object".to_string()))?;

        let mut weights = Vec::with_capacity(RewardTier::PRIORITY.len());
        for tier in RewardTier::PRIORITY {
            let weight = match object.get(tier.as_str()) {
                Some(v) => v.as_f64().ok_or_else(|| {
                    GachaError::InvalidConfig(format!("weight for {} is not a number", tier))
                })?,
                None => 0.0,
            };
            if weight < 0.0 {
                return Err(GachaError::InvalidConfig(format!(
                    "weight for {} is negative",
                    tier
                )));
            }
            weights.push((tier, weight));
        }

        let table = Self { weights };
        if table.total() > 100.0 {
            return Err(GachaError::InvalidConfig(format!(
                "rarity weights sum to {} (> 100)",
                table.total()
            )));
        }
        Ok(table)
    }

    pub fn total(&self) -> f64 {
        self.weights.iter().map(|(_, w)| w).sum()
    }

    /// Walk tiers in priority order, accumulating weights; the first tier
    /// whose cumulative upper bound exceeds the rolled value wins. A value
    /// past every band is no reward.
    pub fn pick(&self, rolled: f64) -> Option<RewardTier> {
        let mut upper = 0.0;
        for (tier, weight) in &self.weights {
            upper += weight;
            if rolled < upper {
                return Some(*tier);
            }
        }
        None
    }
}

/// Rolls a reward tier under the configured table. The table is looked up
/// per roll through the config service, so an admin update takes effect on
/// the next draw without a restart.
pub struct RarityRoller {
    config: Arc<ConfigService>,
}

impl RarityRoller {
    pub fn new(config: Arc<ConfigService>) -> Self {
        Self { config }
    }

    pub async fn table(&self) -> GachaResult<WeightTable> {
        match self
            .config
            .get(keys::CATEGORY_GACHA, keys::RARITY_WEIGHTS)
            .await?
        {
            Some(value) => WeightTable::from_value(&value),
            None => Ok(WeightTable::default_table()),
        }
    }

    pub async fn roll<R: Rng + Send>(&self, rng: &mut R) -> GachaResult<Option<RewardTier>> {
        let table = self.table().await?;
        let rolled = rng.gen_range(0.0..100.0);
        Ok(table.pick(rolled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_pick_band_boundaries() {
        let table = WeightTable::default_table();
        assert_eq!(table.pick(0.0), Some(RewardTier::Sp));
        assert_eq!(table.pick(1.999), Some(RewardTier::Sp));
        assert_eq!(table.pick(2.0), Some(RewardTier::Ssr));
        assert_eq!(table.pick(9.999), Some(RewardTier::Ssr));
        assert_eq!(table.pick(10.0), Some(RewardTier::Sr));
        assert_eq!(table.pick(25.0), Some(RewardTier::S));
        assert_eq!(table.pick(48.0), Some(RewardTier::R));
        assert_eq!(table.pick(79.999), Some(RewardTier::R));
        assert_eq!(table.pick(80.0), None);
        assert_eq!(table.pick(99.999), None);
    }

    #[test]
    fn test_from_value_validates() {
        assert!(WeightTable::from_value(&json!({"SP": 2, "SSR": 8})).is_ok());
        assert!(WeightTable::from_value(&json!({"SP": -1})).is_err());
        assert!(WeightTable::from_value(&json!({"SP": 60, "SSR": 60})).is_err());
        assert!(WeightTable::from_value(&json!([2, 8])).is_err());
        assert!(WeightTable::from_value(&json!({"SP": "two"})).is_err());
    }

    #[test]
    fn test_missing_tier_means_zero_weight() {
        let table = WeightTable::from_value(&json!({"R": 50})).unwrap();
        assert_eq!(table.pick(0.0), Some(RewardTier::R));
        assert_eq!(table.pick(49.9), Some(RewardTier::R));
        assert_eq!(table.pick(50.0), None);
    }

    #[test]
    fn test_distribution_approximates_configured_weights() {
        let table = WeightTable::default_table();
        let mut rng = StdRng::seed_from_u64(0x5901a77);
        let trials = 100_000;

        let mut hits: HashMap<Option<RewardTier>, u64> = HashMap::new();
        for _ in 0..trials {
            let rolled = rng.gen_range(0.0..100.0);
            *hits.entry(table.pick(rolled)).or_insert(0) += 1;
        }

        let expect = |tier: Option<RewardTier>, pct: f64| {
            let observed = *hits.get(&tier).unwrap_or(&0) as f64 / trials as f64 * 100.0;
            assert!(
                (observed - pct).abs() < 1.0,
                "{:?}: observed {:.2}%, expected {:.2}%",
                tier,
                observed,
                pct
            );
        };
        expect(Some(RewardTier::Sp), 2.0);
        expect(Some(RewardTier::Ssr), 8.0);
        expect(Some(RewardTier::Sr), 15.0);
        expect(Some(RewardTier::S), 23.0);
        expect(Some(RewardTier::R), 32.0);
        expect(None, 20.0);
    }
}
