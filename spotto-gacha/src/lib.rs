pub mod engine;
pub mod exclusion;
pub mod models;
pub mod rarity;
pub mod repository;
pub mod selector;
pub mod trips;

#[cfg(test)]
pub(crate) mod testutil;

pub use engine::{DrawEngine, DrawOutcome};
pub use exclusion::{ExclusionLedger, ExclusionRecord, ExclusionScope};
pub use models::DrawSession;
pub use rarity::{RarityRoller, WeightTable};
pub use repository::{DrawSessionRepository, ExclusionRepository, TripRepository};
pub use selector::{DrawSelector, Selection};
pub use trips::{PublishedTrip, TripPublisher};
