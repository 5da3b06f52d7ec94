use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeatStatus {
    Normal,
    Warning,
    Alert,
    Empty,
    Restricted,
}

impl SeatStatus {
    /// Occupied seats carry a student and a live score.
    pub fn is_occupied(self) -> bool {
        !matches!(self, Self::Empty | Self::Restricted)
    }
}

/// Scripted anomaly kind. Tags outside the catalog are kept verbatim so they
/// label alerts and survive a save.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    Whisper,
    RepeatedWhisper,
    PaperRustle,
    Other(String),
}

impl EventType {
    pub fn parse(value: &str) -> Self {
        match value {
            "whisper" => Self::Whisper,
            "repeated_whisper" => Self::RepeatedWhisper,
            "paper_rustle" => Self::PaperRustle,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Whisper => "whisper",
            Self::RepeatedWhisper => "repeated_whisper",
            Self::PaperRustle => "paper_rustle",
            Self::Other(tag) => tag.as_str(),
        }
    }
}

impl Serialize for EventType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::parse(&tag))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineKind {
    Info,
    Warning,
    Success,
    Alert,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateStatus {
    Active,
    Empty,
    Restricted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Idle,
    Running,
    Paused,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub id: String,
    pub row: i32,
    pub col: i32,
    pub status: SeatStatus,
    pub score: i32,
    #[serde(rename = "studentId")]
    pub student_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatEvent {
    #[serde(rename = "seatId")]
    pub seat_id: String,
    pub row: i32,
    pub col: i32,
    #[serde(rename = "eventType")]
    pub event_type: EventType,
    #[serde(rename = "triggerTime")]
    pub trigger_time: u32,
}

impl SeatEvent {
    /// Builds an event whose seat id follows the `row-col` convention.
    pub fn at(row: i32, col: i32, event_type: EventType, trigger_time: u32) -> Self {
        Self {
            seat_id: format!("{row}-{col}"),
            row,
            col,
            event_type,
            trigger_time,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Alert {
    pub id: String,
    pub message: String,
    #[serde(rename = "studentId")]
    pub student_id: String,
    pub severity: Severity,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub type_label: String,
    #[serde(rename = "seatRow")]
    pub seat_row: i32,
    #[serde(rename = "seatCol")]
    pub seat_col: i32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub id: String,
    pub time: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: TimelineKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatTemplate {
    pub id: String,
    pub row: i32,
    pub col: i32,
    pub status: TemplateStatus,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassroomConfig {
    pub id: String,
    pub name: String,
    pub rows: i32,
    pub cols: i32,
    pub seats: Vec<SeatTemplate>,
    pub events: Vec<SeatEvent>,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(rename = "createdBy")]
    pub created_by: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub normal: usize,
    pub warning: usize,
    pub alert: usize,
    pub empty: usize,
    pub restricted: usize,
}

impl StatusCounts {
    pub fn from_seats(seats: &[Seat]) -> Self {
        let mut counts = Self::default();
        for seat in seats {
            match seat.status {
                SeatStatus::Normal => counts.normal += 1,
                SeatStatus::Warning => counts.warning += 1,
                SeatStatus::Alert => counts.alert += 1,
                SeatStatus::Empty => counts.empty += 1,
                SeatStatus::Restricted => counts.restricted += 1,
            }
        }
        counts
    }

    pub fn occupied(&self) -> usize {
        self.normal + self.warning + self.alert
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    #[serde(rename = "elapsedSecs")]
    pub elapsed_secs: u64,
    pub clock: String,
    pub state: PlaybackState,
    pub running: bool,
    pub rows: i32,
    pub cols: i32,
    #[serde(rename = "integrityScore")]
    pub integrity_score: String,
    #[serde(rename = "alertCount")]
    pub alert_count: usize,
    #[serde(rename = "criticalCount")]
    pub critical_count: usize,
    #[serde(rename = "statusCounts")]
    pub status_counts: StatusCounts,
    #[serde(rename = "firedEvents")]
    pub fired_events: usize,
    #[serde(rename = "totalEvents")]
    pub total_events: usize,
    pub seats: Vec<Seat>,
    pub alerts: Vec<Alert>,
    pub timeline: Vec<TimelineEntry>,
}
