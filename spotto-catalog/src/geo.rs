use crate::place::{Place, PlaceCategory};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Distance under which two places of a category count as the same
/// candidate. Lodging never deduplicates: two hotels in one building are
/// still distinct stays.
pub fn dedup_radius_m(category: PlaceCategory) -> f64 {
    match category {
        PlaceCategory::Scenic | PlaceCategory::Cultural => 200.0,
        PlaceCategory::Food | PlaceCategory::Shopping => 50.0,
        PlaceCategory::Activity | PlaceCategory::Entertainment => 100.0,
        PlaceCategory::Lodging => 0.0,
    }
}

/// Whether `a` and `b` are close enough to be the same candidate. A pair
/// mixing categories uses the tighter of the two radii; a missing
/// coordinate on either side means they never collapse.
pub fn within_dedup_radius(a: &Place, b: &Place) -> bool {
    let radius = dedup_radius_m(a.category).min(dedup_radius_m(b.category));
    if radius <= 0.0 {
        return false;
    }
    match (a.latitude, a.longitude, b.latitude, b.longitude) {
        (Some(lat1), Some(lon1), Some(lat2), Some(lon2)) => {
            haversine_m(lat1, lon1, lat2, lon2) <= radius
        }
        _ => false,
    }
}
