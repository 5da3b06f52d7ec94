use crate::constants::{
    DEMO_COLS, DEMO_EMPTY_POSITIONS, DEMO_ROWS, INITIAL_SCORE_MAX, INITIAL_SCORE_MIN,
};
use crate::rng::RandomSource;
use crate::types::{ClassroomConfig, Seat, SeatStatus, TemplateStatus};

pub fn student_id(row: i32, col: i32, cols: i32) -> String {
    format!("STU-{:03}", row * cols + col + 1)
}

pub fn seat_key(row: i32, col: i32) -> String {
    format!("{row}-{col}")
}

/// Fixed 6x8 hall with two vacant positions.
pub fn demo_seats<R: RandomSource>(rng: &mut R) -> Vec<Seat> {
    let mut seats = Vec::with_capacity((DEMO_ROWS * DEMO_COLS) as usize);
    for row in 0..DEMO_ROWS {
        for col in 0..DEMO_COLS {
            if DEMO_EMPTY_POSITIONS.contains(&(row, col)) {
                seats.push(vacant_seat(seat_key(row, col), row, col));
            } else {
                seats.push(occupied_seat(
                    seat_key(row, col),
                    row,
                    col,
                    DEMO_COLS,
                    rng,
                ));
            }
        }
    }
    seats
}

/// Runtime seats for a saved classroom, in template order.
///
/// Restricted templates collapse to `empty` at runtime.
pub fn classroom_seats<R: RandomSource>(config: &ClassroomConfig, rng: &mut R) -> Vec<Seat> {
    config
        .seats
        .iter()
        .map(|template| match template.status {
            TemplateStatus::Active => occupied_seat(
                template.id.clone(),
                template.row,
                template.col,
                config.cols,
                rng,
            ),
            TemplateStatus::Empty | TemplateStatus::Restricted => {
                vacant_seat(template.id.clone(), template.row, template.col)
            }
        })
        .collect()
}

fn occupied_seat<R: RandomSource>(id: String, row: i32, col: i32, cols: i32, rng: &mut R) -> Seat {
    Seat {
        id,
        row,
        col,
        status: SeatStatus::Normal,
        score: rng.int(INITIAL_SCORE_MIN, INITIAL_SCORE_MAX),
        student_id: student_id(row, col, cols),
    }
}

fn vacant_seat(id: String, row: i32, col: i32) -> Seat {
    Seat {
        id,
        row,
        col,
        status: SeatStatus::Empty,
        score: 0,
        student_id: String::new(),
    }
}
