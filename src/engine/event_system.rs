use crate::catalog::{impact_of, messages_for, severity_of, type_label};
use crate::constants::PROXIMITY_RADIUS;
use crate::rng::RandomSource;
use crate::types::{Alert, Seat, SeatEvent, Severity, TimelineEntry, TimelineKind};

use super::utils::{chebyshev, proximity_impact, rescore};

/// Identity and wall-clock stamp for the records produced by one event.
#[derive(Clone, Debug)]
pub struct EventStamp {
    pub alert_id: String,
    pub timeline_id: String,
    pub time_label: String,
}

#[derive(Clone, Debug)]
pub struct EventOutcome {
    pub seats: Vec<Seat>,
    pub alert: Alert,
    pub timeline: TimelineEntry,
}

/// Applies one scripted event to a seat collection.
///
/// The target seat takes the full impact, occupied seats in its
/// 8-neighbourhood take the proximity share, everything else is copied
/// unchanged. A missing target only skips the direct update.
pub fn process_event<R: RandomSource>(
    seats: &[Seat],
    event: &SeatEvent,
    rng: &mut R,
    stamp: EventStamp,
) -> EventOutcome {
    let impact = impact_of(&event.event_type);
    let messages = messages_for(&event.event_type);
    let message = messages[rng.pick_index(messages.len())].to_string();
    let severity = severity_of(&event.event_type);
    let neighbour_impact = proximity_impact(impact);

    let updated = seats
        .iter()
        .map(|seat| {
            if seat.id == event.seat_id {
                return rescore(seat, impact);
            }
            if seat.status.is_occupied()
                && chebyshev(seat.row, seat.col, event.row, event.col) <= PROXIMITY_RADIUS
            {
                return rescore(seat, neighbour_impact);
            }
            seat.clone()
        })
        .collect();

    let student_id = seats
        .iter()
        .find(|seat| seat.id == event.seat_id)
        .map(|seat| seat.student_id.clone())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("R{}C{}", event.row + 1, event.col + 1));

    let label = type_label(&event.event_type);
    let timeline = TimelineEntry {
        id: stamp.timeline_id,
        time: stamp.time_label,
        message: format!(
            "{label}: {message} at Row {}, Col {}",
            event.row + 1,
            event.col + 1
        ),
        kind: timeline_kind(severity),
    };
    let alert = Alert {
        id: stamp.alert_id,
        message,
        student_id,
        severity,
        timestamp: "just now".to_string(),
        type_label: label,
        seat_row: event.row,
        seat_col: event.col,
    };

    EventOutcome {
        seats: updated,
        alert,
        timeline,
    }
}

fn timeline_kind(severity: Severity) -> TimelineKind {
    match severity {
        Severity::High => TimelineKind::Alert,
        Severity::Medium => TimelineKind::Warning,
        Severity::Low => TimelineKind::Info,
    }
}
