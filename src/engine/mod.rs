use std::collections::HashSet;

use crate::catalog::demo_events;
use crate::constants::{
    ALERT_DISPLAY_LIMIT, DEMO_COLS, DEMO_ROWS, DRIFT_EVERY_SECS, MAX_ALERT_HISTORY,
    MAX_TIMELINE_HISTORY, SESSION_INITIALIZED_MESSAGE, TIMELINE_DISPLAY_LIMIT,
};
use crate::layout::{classroom_seats, demo_seats};
use crate::rng::{RandomSource, Rng};
use crate::types::{
    Alert, ClassroomConfig, PlaybackState, Seat, SeatEvent, Severity, Snapshot, StatusCounts,
    TimelineEntry, TimelineKind,
};

mod drift_system;
mod event_system;
mod utils;

pub use self::drift_system::apply_drift;
pub use self::event_system::{process_event, EventOutcome, EventStamp};
pub use self::utils::{integrity_score, status_for_score};

use self::utils::{elapsed_clock, wall_clock_label};

/// What a single tick did, for logging and the headless runner.
#[derive(Clone, Debug, Default)]
pub struct TickReport {
    pub elapsed_secs: u64,
    pub fired: Vec<usize>,
    pub drifted: bool,
}

/// Playback controller for one monitoring session.
///
/// Owns the working seats, the alert and timeline histories, the elapsed
/// clock and the set of catalog indices that already fired. The layout and
/// event catalog are fixed at construction; `reset` restores the layout.
#[derive(Clone, Debug)]
pub struct SimulationEngine<R: RandomSource = Rng> {
    rows: i32,
    cols: i32,
    layout: Vec<Seat>,
    events: Vec<SeatEvent>,
    rng: R,
    clock: fn() -> String,

    seats: Vec<Seat>,
    alerts: Vec<Alert>,
    timeline: Vec<TimelineEntry>,
    fired: HashSet<usize>,
    state: PlaybackState,
    elapsed_secs: u64,
    total_alerts: usize,
    critical_alerts: usize,
    next_id_counter: u64,
}

impl SimulationEngine<Rng> {
    pub fn demo(seed: u32) -> Self {
        let mut rng = Rng::new(seed);
        let layout = demo_seats(&mut rng);
        Self::new(DEMO_ROWS, DEMO_COLS, layout, demo_events(), rng)
    }

    pub fn from_classroom(config: &ClassroomConfig, seed: u32) -> Self {
        let mut rng = Rng::new(seed);
        let layout = classroom_seats(config, &mut rng);
        Self::new(config.rows, config.cols, layout, config.events.clone(), rng)
    }
}

impl<R: RandomSource> SimulationEngine<R> {
    pub fn new(rows: i32, cols: i32, layout: Vec<Seat>, events: Vec<SeatEvent>, rng: R) -> Self {
        let mut engine = Self {
            rows,
            cols,
            seats: layout.clone(),
            layout,
            events,
            rng,
            clock: wall_clock_label,
            alerts: Vec::new(),
            timeline: Vec::new(),
            fired: HashSet::new(),
            state: PlaybackState::Idle,
            elapsed_secs: 0,
            total_alerts: 0,
            critical_alerts: 0,
            next_id_counter: 1,
        };
        engine.reset();
        engine
    }

    /// Replaces the wall-clock label source used for timeline entries.
    pub fn with_clock(mut self, clock: fn() -> String) -> Self {
        self.clock = clock;
        self.reset();
        self
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == PlaybackState::Running
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed_secs
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn alerts(&self) -> &[Alert] {
        &self.alerts
    }

    pub fn timeline(&self) -> &[TimelineEntry] {
        &self.timeline
    }

    pub fn events(&self) -> &[SeatEvent] {
        &self.events
    }

    pub fn fired_count(&self) -> usize {
        self.fired.len()
    }

    pub fn has_fired(&self, index: usize) -> bool {
        self.fired.contains(&index)
    }

    pub fn seat_detail(&self, seat_id: &str) -> Option<&Seat> {
        self.seats.iter().find(|seat| seat.id == seat_id)
    }

    pub fn integrity_score(&self) -> String {
        integrity_score(&self.seats)
    }

    pub fn reset(&mut self) {
        self.seats = self.layout.clone();
        self.alerts.clear();
        self.timeline = vec![TimelineEntry {
            id: "start".to_string(),
            time: (self.clock)(),
            message: SESSION_INITIALIZED_MESSAGE.to_string(),
            kind: TimelineKind::Success,
        }];
        self.fired.clear();
        self.state = PlaybackState::Idle;
        self.elapsed_secs = 0;
        self.total_alerts = 0;
        self.critical_alerts = 0;
        self.next_id_counter = 1;
    }

    /// Returns `true` when the session moved into `Running`.
    pub fn start(&mut self) -> bool {
        if self.state == PlaybackState::Running {
            return false;
        }
        self.state = PlaybackState::Running;
        true
    }

    /// Returns `true` when a running session was paused.
    pub fn pause(&mut self) -> bool {
        if self.state != PlaybackState::Running {
            return false;
        }
        self.state = PlaybackState::Paused;
        true
    }

    /// Advances playback by one second.
    ///
    /// Due events fire in catalog order, each seeing the seats left by the
    /// previous one; drift runs afterwards on every fourth second.
    pub fn tick(&mut self) -> TickReport {
        if self.state != PlaybackState::Running {
            return TickReport {
                elapsed_secs: self.elapsed_secs,
                ..TickReport::default()
            };
        }
        self.elapsed_secs += 1;
        let mut report = TickReport {
            elapsed_secs: self.elapsed_secs,
            ..TickReport::default()
        };

        for index in 0..self.events.len() {
            if self.fired.contains(&index)
                || u64::from(self.events[index].trigger_time) > self.elapsed_secs
            {
                continue;
            }
            self.fired.insert(index);
            self.fire_event(index);
            report.fired.push(index);
        }

        if self.elapsed_secs % DRIFT_EVERY_SECS == 0 {
            self.seats = apply_drift(&self.seats, &mut self.rng);
            report.drifted = true;
        }
        report
    }

    pub fn snapshot(&self, alert_limit: usize, timeline_limit: usize) -> Snapshot {
        Snapshot {
            elapsed_secs: self.elapsed_secs,
            clock: elapsed_clock(self.elapsed_secs),
            state: self.state,
            running: self.is_running(),
            rows: self.rows,
            cols: self.cols,
            integrity_score: self.integrity_score(),
            alert_count: self.total_alerts,
            critical_count: self.critical_alerts,
            status_counts: StatusCounts::from_seats(&self.seats),
            fired_events: self.fired.len(),
            total_events: self.events.len(),
            seats: self.seats.clone(),
            alerts: self.alerts.iter().take(alert_limit).cloned().collect(),
            timeline: self.timeline.iter().take(timeline_limit).cloned().collect(),
        }
    }

    pub fn display_snapshot(&self) -> Snapshot {
        self.snapshot(ALERT_DISPLAY_LIMIT, TIMELINE_DISPLAY_LIMIT)
    }

    fn fire_event(&mut self, index: usize) {
        let stamp = EventStamp {
            alert_id: self.make_id("alert"),
            timeline_id: self.make_id("timeline"),
            time_label: (self.clock)(),
        };
        let outcome = process_event(&self.seats, &self.events[index], &mut self.rng, stamp);
        self.seats = outcome.seats;

        self.total_alerts += 1;
        if outcome.alert.severity == Severity::High {
            self.critical_alerts += 1;
        }
        self.alerts.insert(0, outcome.alert);
        self.alerts.truncate(MAX_ALERT_HISTORY);
        self.timeline.insert(0, outcome.timeline);
        self.timeline.truncate(MAX_TIMELINE_HISTORY);
    }

    fn make_id(&mut self, prefix: &str) -> String {
        let id = format!("{prefix}_{}", self.next_id_counter);
        self.next_id_counter += 1;
        id
    }
}
