use crate::constants::{
    ALERT_DISPLAY_LIMIT, MAX_ALERT_HISTORY, MAX_GRID_COLS, MAX_GRID_ROWS, MIN_GRID_COLS,
    MIN_GRID_ROWS,
};

/// Parses a `?limit=` style value; invalid input falls back to the default.
pub fn parse_limit(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(default)
        .min(MAX_ALERT_HISTORY)
}

pub fn parse_alert_limit(raw: Option<&str>) -> usize {
    parse_limit(raw, ALERT_DISPLAY_LIMIT)
}

pub fn sanitize_classroom_name(value: &str) -> String {
    value.trim().chars().take(64).collect()
}

pub fn normalize_grid(rows: Option<i64>, cols: Option<i64>) -> (i32, i32) {
    let rows = rows
        .unwrap_or(6)
        .clamp(MIN_GRID_ROWS as i64, MAX_GRID_ROWS as i64) as i32;
    let cols = cols
        .unwrap_or(8)
        .clamp(MIN_GRID_COLS as i64, MAX_GRID_COLS as i64) as i32;
    (rows, cols)
}

pub fn normalize_seed(seed: i64) -> u32 {
    seed as u32
}
