pub const TICK_MS: u64 = 1_000;
pub const DRIFT_EVERY_SECS: u64 = 4;

pub const ALERT_SCORE_BELOW: i32 = 30;
pub const WARNING_SCORE_BELOW: i32 = 60;
pub const RECOVERY_SCORE_BELOW: i32 = 70;
pub const MIN_SCORE: i32 = 0;
pub const MAX_SCORE: i32 = 100;

pub const INITIAL_SCORE_MIN: i32 = 85;
pub const INITIAL_SCORE_MAX: i32 = 99;

pub const DRIFT_DELTA_MIN: i32 = -2;
pub const DRIFT_DELTA_MAX: i32 = 2;
pub const RECOVERY_BONUS: i32 = 1;

/// Neighbours receive this share of the event impact, in percent.
pub const PROXIMITY_IMPACT_PERCENT: i32 = 30;
pub const PROXIMITY_RADIUS: i32 = 1;

pub const DEMO_ROWS: i32 = 6;
pub const DEMO_COLS: i32 = 8;
pub const DEMO_EMPTY_POSITIONS: [(i32, i32); 2] = [(2, 5), (4, 0)];

pub const MIN_GRID_ROWS: i32 = 2;
pub const MAX_GRID_ROWS: i32 = 12;
pub const MIN_GRID_COLS: i32 = 2;
pub const MAX_GRID_COLS: i32 = 16;
pub const DEFAULT_EVENT_TRIGGER_SECS: u32 = 30;

pub const MAX_ALERT_HISTORY: usize = 200;
pub const MAX_TIMELINE_HISTORY: usize = 200;
pub const ALERT_DISPLAY_LIMIT: usize = 10;
pub const TIMELINE_DISPLAY_LIMIT: usize = 8;

pub const SESSION_INITIALIZED_MESSAGE: &str = "Monitoring session initialized";
pub const DEFAULT_CLASSROOM_NAME: &str = "Untitled Classroom";
