use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;
use uuid::Uuid;

use spotto_catalog::geo::within_dedup_radius;
use spotto_catalog::scoring::candidate_score;
use spotto_catalog::{Place, PlaceRepository};
use spotto_core::GachaResult;
use spotto_shared::Locale;

use crate::exclusion::ExclusionLedger;

/// The candidate set a draw works with. A shortfall is a deliberate
/// degrade-gracefully outcome: the draw proceeds with what was found.
#[derive(Debug, Clone)]
pub struct Selection {
    pub places: Vec<Place>,
    pub shortfall: bool,
}

/// Builds the exclusion-filtered, geo-deduplicated candidate pool for a
/// draw and samples the requested number of places from it.
pub struct DrawSelector {
    places: Arc<dyn PlaceRepository>,
    exclusions: Arc<ExclusionLedger>,
}

impl DrawSelector {
    pub fn new(places: Arc<dyn PlaceRepository>, exclusions: Arc<ExclusionLedger>) -> Self {
        Self { places, exclusions }
    }

    pub async fn select_candidates<R: Rng + Send>(
        &self,
        user_id: Uuid,
        locale: &Locale,
        count: usize,
        rng: &mut R,
    ) -> GachaResult<Selection> {
        let active = self.places.list_active(locale).await?;
        let excluded = self.exclusions.excluded_names(user_id, locale).await?;

        let mut pool: Vec<Place> = active
            .into_iter()
            .filter(|p| p.is_active && !excluded.contains(&p.name))
            .collect();

        // Score order makes the dedup deterministic: when two places fall
        // within radius, the better listing is already in the kept set.
        pool.sort_by(|a, b| {
            candidate_score(b)
                .partial_cmp(&candidate_score(a))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut survivors: Vec<Place> = Vec::with_capacity(pool.len());
        for place in pool {
            if !survivors.iter().any(|kept| within_dedup_radius(kept, &place)) {
                survivors.push(place);
            }
        }

        let shortfall = survivors.len() < count;
        survivors.shuffle(rng);
        survivors.truncate(count);

        debug!(
            user_id = %user_id,
            locale = %locale,
            picked = survivors.len(),
            shortfall,
            "draw candidates selected"
        );
        Ok(Selection {
            places: survivors,
            shortfall,
        })
    }
}
