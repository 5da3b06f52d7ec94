use chrono::{Local, Timelike};

use crate::constants::{
    ALERT_SCORE_BELOW, MAX_SCORE, MIN_SCORE, PROXIMITY_IMPACT_PERCENT, WARNING_SCORE_BELOW,
};
use crate::types::{Seat, SeatStatus};

pub(super) fn chebyshev(ar: i32, ac: i32, br: i32, bc: i32) -> i32 {
    (ar - br).abs().max((ac - bc).abs())
}

pub(super) fn clamp_score(score: i32) -> i32 {
    score.clamp(MIN_SCORE, MAX_SCORE)
}

pub fn status_for_score(score: i32) -> SeatStatus {
    if score < ALERT_SCORE_BELOW {
        SeatStatus::Alert
    } else if score < WARNING_SCORE_BELOW {
        SeatStatus::Warning
    } else {
        SeatStatus::Normal
    }
}

/// Applies a score delta to an occupied seat; unoccupied seats pass through.
pub(super) fn rescore(seat: &Seat, delta: i32) -> Seat {
    if !seat.status.is_occupied() {
        return seat.clone();
    }
    let score = clamp_score(seat.score + delta);
    Seat {
        score,
        status: status_for_score(score),
        ..seat.clone()
    }
}

/// Share of an event impact felt by neighbouring seats, truncated toward zero.
pub(super) fn proximity_impact(impact: i32) -> i32 {
    impact * PROXIMITY_IMPACT_PERCENT / 100
}

pub(super) fn wall_clock_label() -> String {
    let now = Local::now();
    format!("{:02}:{:02}", now.hour(), now.minute())
}

pub(super) fn elapsed_clock(elapsed_secs: u64) -> String {
    format!("{:02}:{:02}", elapsed_secs / 60, elapsed_secs % 60)
}

/// Mean score of occupied seats with one decimal, rounding halves up.
pub fn integrity_score(seats: &[Seat]) -> String {
    let (sum, count) = seats
        .iter()
        .filter(|seat| seat.status.is_occupied())
        .fold((0i64, 0i64), |(sum, count), seat| {
            (sum + seat.score as i64, count + 1)
        });
    if count == 0 {
        return "0.0".to_string();
    }
    let tenths = (sum * 20 + count) / (count * 2);
    format!("{}.{}", tenths / 10, tenths % 10)
}
