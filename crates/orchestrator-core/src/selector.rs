use crate::model::TravelMode;

/// Trips up to and including this many meters are walked.
pub const WALKING_THRESHOLD_METERS: i64 = 1000;

pub fn select_mode(distance_meters: i64) -> TravelMode {
    if distance_meters <= WALKING_THRESHOLD_METERS {
        TravelMode::Walking
    } else {
        TravelMode::Transit
    }
}
