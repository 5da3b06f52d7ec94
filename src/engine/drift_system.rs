use crate::constants::{DRIFT_DELTA_MAX, DRIFT_DELTA_MIN, RECOVERY_BONUS, RECOVERY_SCORE_BELOW};
use crate::rng::RandomSource;
use crate::types::Seat;

use super::utils::rescore;

/// Random jitter in `[-2, 2]` for every occupied seat, plus a one-point
/// recovery bonus below 70.
pub fn apply_drift<R: RandomSource>(seats: &[Seat], rng: &mut R) -> Vec<Seat> {
    seats
        .iter()
        .map(|seat| {
            if !seat.status.is_occupied() {
                return seat.clone();
            }
            let delta = rng.int(DRIFT_DELTA_MIN, DRIFT_DELTA_MAX);
            let recovery = if seat.score < RECOVERY_SCORE_BELOW {
                RECOVERY_BONUS
            } else {
                0
            };
            rescore(seat, delta + recovery)
        })
        .collect()
}
