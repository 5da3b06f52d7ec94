use crate::types::{EventType, SeatEvent, Severity};

const DEMO_EVENTS: [(i32, i32, EventType, u32); 10] = [
    (1, 3, EventType::Whisper, 8),
    (0, 6, EventType::PaperRustle, 15),
    (2, 1, EventType::RepeatedWhisper, 22),
    (3, 5, EventType::Whisper, 35),
    (4, 2, EventType::PaperRustle, 45),
    (1, 7, EventType::RepeatedWhisper, 55),
    (5, 4, EventType::Whisper, 65),
    (3, 0, EventType::PaperRustle, 78),
    (0, 2, EventType::RepeatedWhisper, 90),
    (4, 6, EventType::Whisper, 100),
];

/// The scripted demo sequence, in firing order.
pub fn demo_events() -> Vec<SeatEvent> {
    DEMO_EVENTS
        .iter()
        .map(|(row, col, event_type, trigger_time)| {
            SeatEvent::at(*row, *col, event_type.clone(), *trigger_time)
        })
        .collect()
}

pub fn impact_of(event_type: &EventType) -> i32 {
    match event_type {
        EventType::Whisper => -15,
        EventType::RepeatedWhisper => -30,
        EventType::PaperRustle => -10,
        EventType::Other(_) => -10,
    }
}

pub fn messages_for(event_type: &EventType) -> &'static [&'static str] {
    match event_type {
        EventType::Whisper => &[
            "Whisper detected in proximity zone",
            "Low-volume verbal activity detected",
        ],
        EventType::RepeatedWhisper => &[
            "Repeated whispering pattern detected",
            "Sustained verbal exchange flagged",
        ],
        EventType::PaperRustle => &[
            "Paper rustling anomaly detected",
            "Unusual paper movement near seat",
        ],
        EventType::Other(_) => &["Anomaly detected"],
    }
}

pub fn severity_of(event_type: &EventType) -> Severity {
    match event_type {
        EventType::RepeatedWhisper => Severity::High,
        EventType::Whisper => Severity::Medium,
        EventType::PaperRustle | EventType::Other(_) => Severity::Low,
    }
}

/// `repeated_whisper` -> `Repeated Whisper`; unknown tags are labelled the same way.
pub fn type_label(event_type: &EventType) -> String {
    event_type
        .as_str()
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn demo_sequence_spans_all_types_in_time_order() {
        let events = demo_events();
        assert_eq!(events.len(), 10);
        assert_eq!(events.first().map(|e| e.trigger_time), Some(8));
        assert_eq!(events.last().map(|e| e.trigger_time), Some(100));
        assert!(events
            .windows(2)
            .all(|pair| pair[0].trigger_time <= pair[1].trigger_time));

        let kinds: HashSet<EventType> = events.iter().map(|e| e.event_type.clone()).collect();
        assert!(kinds.contains(&EventType::Whisper));
        assert!(kinds.contains(&EventType::RepeatedWhisper));
        assert!(kinds.contains(&EventType::PaperRustle));

        for event in &events {
            assert_eq!(event.seat_id, format!("{}-{}", event.row, event.col));
        }
    }

    #[test]
    fn impact_table_matches_event_weights() {
        assert_eq!(impact_of(&EventType::Whisper), -15);
        assert_eq!(impact_of(&EventType::RepeatedWhisper), -30);
        assert_eq!(impact_of(&EventType::PaperRustle), -10);
        assert_eq!(impact_of(&EventType::Other("none".to_string())), -10);
    }

    #[test]
    fn severity_follows_event_type() {
        assert_eq!(severity_of(&EventType::RepeatedWhisper), Severity::High);
        assert_eq!(severity_of(&EventType::Whisper), Severity::Medium);
        assert_eq!(severity_of(&EventType::PaperRustle), Severity::Low);
        assert_eq!(severity_of(&EventType::Other("none".to_string())), Severity::Low);
    }

    #[test]
    fn type_labels_are_title_cased() {
        assert_eq!(type_label(&EventType::Whisper), "Whisper");
        assert_eq!(type_label(&EventType::RepeatedWhisper), "Repeated Whisper");
        assert_eq!(type_label(&EventType::PaperRustle), "Paper Rustle");
        assert_eq!(type_label(&EventType::Other("none".to_string())), "None");
        assert_eq!(
            type_label(&EventType::Other("loud_cough".to_string())),
            "Loud Cough"
        );
    }

    #[test]
    fn every_type_has_candidate_messages() {
        for kind in [
            EventType::Whisper,
            EventType::RepeatedWhisper,
            EventType::PaperRustle,
            EventType::Other("none".to_string()),
        ] {
            assert!(!messages_for(&kind).is_empty());
        }
    }
}
