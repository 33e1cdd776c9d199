use crate::place::Place;

const COORDINATES_BONUS: f64 = 0.5;
const PHOTO_BONUS: f64 = 0.3;
const DESCRIPTION_BONUS: f64 = 0.2;

/// Composite quality score used to pick the survivor of a dedup pair:
/// catalog rating plus bonuses for richer listings.
pub fn candidate_score(place: &Place) -> f64 {
    let mut score = place.rating;
    if place.has_coordinates() {
        score += COORDINATES_BONUS;
    }
    if place.photo_url.is_some() {
        score += PHOTO_BONUS;
    }
    if place.description.is_some() {
        score += DESCRIPTION_BONUS;
    }
    score
}
