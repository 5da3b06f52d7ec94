use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::constants::{
    DEFAULT_CLASSROOM_NAME, DEFAULT_EVENT_TRIGGER_SECS, MAX_GRID_COLS, MAX_GRID_ROWS,
    MIN_GRID_COLS, MIN_GRID_ROWS,
};
use crate::layout::seat_key;
use crate::types::{ClassroomConfig, EventType, SeatEvent, SeatTemplate, TemplateStatus};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("grid {rows}x{cols} is outside 2..=12 rows by 2..=16 cols")]
    GridSize { rows: i32, cols: i32 },
    #[error("expected {expected} seat templates, found {found}")]
    SeatCount { expected: usize, found: usize },
    #[error("seat template {id} at ({row}, {col}) is outside the grid")]
    SeatOutOfGrid { id: String, row: i32, col: i32 },
    #[error("duplicate seat template at ({row}, {col})")]
    DuplicateSeat { row: i32, col: i32 },
    #[error("event {index} targets ({row}, {col}) which is outside the grid")]
    EventOutOfGrid { index: usize, row: i32, col: i32 },
    #[error("event {index} names seat {seat_id} but the seat at that position is {expected}")]
    EventSeatMismatch {
        index: usize,
        seat_id: String,
        expected: String,
    },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid classroom: {0}")]
    Invalid(#[from] ValidationError),
    #[error("classroom store io: {0}")]
    Io(#[from] io::Error),
    #[error("classroom store encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Storage port for saved classroom layouts.
///
/// The simulation never talks to a store; callers look a config up and hand
/// it to the engine as plain data.
pub trait ClassroomStore {
    fn get(&self, id: &str) -> Option<ClassroomConfig>;
    /// Inserts or replaces by id after validation.
    fn put(&mut self, classroom: ClassroomConfig) -> Result<(), StoreError>;
    /// Returns whether a classroom was removed.
    fn delete(&mut self, id: &str) -> Result<bool, StoreError>;
    fn list(&self) -> Vec<ClassroomConfig>;
}

impl ClassroomConfig {
    /// A grid of active seats with no events.
    pub fn blank(name: &str, rows: i32, cols: i32, created_by: &str) -> Self {
        let name = name.trim();
        let mut seats = Vec::new();
        for row in 0..rows {
            for col in 0..cols {
                seats.push(SeatTemplate {
                    id: seat_key(row, col),
                    row,
                    col,
                    status: TemplateStatus::Active,
                });
            }
        }
        Self {
            id: Uuid::new_v4().to_string(),
            name: if name.is_empty() {
                DEFAULT_CLASSROOM_NAME.to_string()
            } else {
                name.to_string()
            },
            rows,
            cols,
            seats,
            events: Vec::new(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            created_by: if created_by.trim().is_empty() {
                "unknown".to_string()
            } else {
                created_by.trim().to_string()
            },
        }
    }

    pub fn set_seat_status(&mut self, row: i32, col: i32, status: TemplateStatus) -> bool {
        match self
            .seats
            .iter_mut()
            .find(|seat| seat.row == row && seat.col == col)
        {
            Some(seat) => {
                seat.status = status;
                true
            }
            None => false,
        }
    }

    /// Schedules a whisper at the default trigger time on an active seat.
    pub fn add_event(&mut self, row: i32, col: i32) -> bool {
        let Some(seat) = self
            .seats
            .iter()
            .find(|seat| seat.row == row && seat.col == col)
        else {
            return false;
        };
        if seat.status != TemplateStatus::Active {
            return false;
        }
        self.events.push(SeatEvent {
            seat_id: seat.id.clone(),
            row,
            col,
            event_type: EventType::Whisper,
            trigger_time: DEFAULT_EVENT_TRIGGER_SECS,
        });
        true
    }
}

pub fn validate_classroom(config: &ClassroomConfig) -> Result<(), ValidationError> {
    if !(MIN_GRID_ROWS..=MAX_GRID_ROWS).contains(&config.rows)
        || !(MIN_GRID_COLS..=MAX_GRID_COLS).contains(&config.cols)
    {
        return Err(ValidationError::GridSize {
            rows: config.rows,
            cols: config.cols,
        });
    }
    let expected = (config.rows * config.cols) as usize;
    if config.seats.len() != expected {
        return Err(ValidationError::SeatCount {
            expected,
            found: config.seats.len(),
        });
    }

    let mut seen = HashSet::new();
    for seat in &config.seats {
        if seat.row < 0 || seat.col < 0 || seat.row >= config.rows || seat.col >= config.cols {
            return Err(ValidationError::SeatOutOfGrid {
                id: seat.id.clone(),
                row: seat.row,
                col: seat.col,
            });
        }
        if !seen.insert((seat.row, seat.col)) {
            return Err(ValidationError::DuplicateSeat {
                row: seat.row,
                col: seat.col,
            });
        }
    }

    for (index, event) in config.events.iter().enumerate() {
        let seat = config
            .seats
            .iter()
            .find(|seat| seat.row == event.row && seat.col == event.col)
            .ok_or(ValidationError::EventOutOfGrid {
                index,
                row: event.row,
                col: event.col,
            })?;
        if seat.id != event.seat_id {
            return Err(ValidationError::EventSeatMismatch {
                index,
                seat_id: event.seat_id.clone(),
                expected: seat.id.clone(),
            });
        }
    }
    Ok(())
}

#[derive(Clone, Debug, Default)]
pub struct MemoryClassroomStore {
    classrooms: Vec<ClassroomConfig>,
}

impl MemoryClassroomStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClassroomStore for MemoryClassroomStore {
    fn get(&self, id: &str) -> Option<ClassroomConfig> {
        self.classrooms.iter().find(|c| c.id == id).cloned()
    }

    fn put(&mut self, classroom: ClassroomConfig) -> Result<(), StoreError> {
        validate_classroom(&classroom)?;
        upsert(&mut self.classrooms, classroom);
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let before = self.classrooms.len();
        self.classrooms.retain(|c| c.id != id);
        Ok(self.classrooms.len() != before)
    }

    fn list(&self) -> Vec<ClassroomConfig> {
        self.classrooms.clone()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ClassroomStoreFile {
    version: u8,
    classrooms: Vec<ClassroomConfig>,
}

#[derive(Clone, Debug, Deserialize)]
struct ClassroomStoreFileRaw {
    version: u8,
    classrooms: Vec<serde_json::Value>,
}

/// JSON file adapter; every mutation rewrites the whole file.
pub struct JsonFileClassroomStore {
    file_path: PathBuf,
    classrooms: Vec<ClassroomConfig>,
}

impl JsonFileClassroomStore {
    pub fn new(file_path: PathBuf) -> Self {
        let classrooms = load_classrooms(&file_path);
        Self {
            file_path,
            classrooms,
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = ClassroomStoreFile {
            version: 1,
            classrooms: self.classrooms.clone(),
        };
        let text = serde_json::to_string_pretty(&payload)?;
        fs::write(&self.file_path, text)?;
        Ok(())
    }
}

impl ClassroomStore for JsonFileClassroomStore {
    fn get(&self, id: &str) -> Option<ClassroomConfig> {
        self.classrooms.iter().find(|c| c.id == id).cloned()
    }

    fn put(&mut self, classroom: ClassroomConfig) -> Result<(), StoreError> {
        validate_classroom(&classroom)?;
        upsert(&mut self.classrooms, classroom);
        self.save()
    }

    fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        let before = self.classrooms.len();
        self.classrooms.retain(|c| c.id != id);
        if self.classrooms.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    fn list(&self) -> Vec<ClassroomConfig> {
        self.classrooms.clone()
    }
}

fn upsert(classrooms: &mut Vec<ClassroomConfig>, classroom: ClassroomConfig) {
    match classrooms.iter_mut().find(|c| c.id == classroom.id) {
        Some(existing) => *existing = classroom,
        None => classrooms.push(classroom),
    }
}

fn load_classrooms(file_path: &Path) -> Vec<ClassroomConfig> {
    let text = match fs::read_to_string(file_path) {
        Ok(text) => text,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Vec::new(),
        Err(error) => {
            eprintln!(
                "[classroom-store] failed to read {}: {error}",
                file_path.display()
            );
            return Vec::new();
        }
    };
    let raw: ClassroomStoreFileRaw = match serde_json::from_str(&text) {
        Ok(raw) => raw,
        Err(error) => {
            eprintln!(
                "[classroom-store] failed to parse {}: {error}",
                file_path.display()
            );
            return Vec::new();
        }
    };
    if raw.version != 1 {
        eprintln!(
            "[classroom-store] unsupported version {} in {}",
            raw.version,
            file_path.display()
        );
        return Vec::new();
    }

    // skip entries that no longer decode or validate instead of dropping the file
    let mut classrooms = Vec::new();
    for value in raw.classrooms {
        match serde_json::from_value::<ClassroomConfig>(value) {
            Ok(config) => match validate_classroom(&config) {
                Ok(()) => classrooms.push(config),
                Err(error) => eprintln!(
                    "[classroom-store] skipping classroom {}: {error}",
                    config.id
                ),
            },
            Err(error) => eprintln!("[classroom-store] skipping undecodable entry: {error}"),
        }
    }
    classrooms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SimulationEngine;
    use crate::types::SeatStatus;

    fn temp_file(name: &str) -> PathBuf {
        let unique = format!(
            "{}-{}-{}",
            name,
            std::process::id(),
            rand::random::<u32>()
        );
        std::env::temp_dir().join(unique).join("classrooms.json")
    }

    fn sample_classroom() -> ClassroomConfig {
        let mut config = ClassroomConfig::blank("  Hall B ", 3, 4, "admin-1");
        config.set_seat_status(0, 0, TemplateStatus::Empty);
        config.set_seat_status(2, 3, TemplateStatus::Restricted);
        assert!(config.add_event(1, 1));
        config
    }

    #[test]
    fn blank_classroom_defaults() {
        let config = ClassroomConfig::blank("   ", 2, 2, "");
        assert_eq!(config.name, "Untitled Classroom");
        assert_eq!(config.created_by, "unknown");
        assert_eq!(config.seats.len(), 4);
        assert!(Uuid::parse_str(&config.id).is_ok());
        assert!(validate_classroom(&config).is_ok());
    }

    #[test]
    fn events_only_attach_to_active_seats() {
        let mut config = sample_classroom();
        assert!(!config.add_event(0, 0));
        assert!(!config.add_event(2, 3));
        assert!(!config.add_event(7, 7));
        assert_eq!(config.events.len(), 1);
        assert_eq!(config.events[0].seat_id, "1-1");
        assert_eq!(config.events[0].trigger_time, 30);
        assert_eq!(config.events[0].event_type, EventType::Whisper);
    }

    #[test]
    fn validation_rejects_bad_grids_and_events() {
        let mut config = sample_classroom();
        config.rows = 13;
        assert!(matches!(
            validate_classroom(&config),
            Err(ValidationError::GridSize { .. })
        ));

        let mut config = sample_classroom();
        config.seats.pop();
        assert!(matches!(
            validate_classroom(&config),
            Err(ValidationError::SeatCount { .. })
        ));

        let mut config = sample_classroom();
        config.seats[1].col = 0;
        assert_eq!(
            validate_classroom(&config),
            Err(ValidationError::DuplicateSeat { row: 0, col: 0 })
        );

        let mut config = sample_classroom();
        config.events.push(SeatEvent::at(3, 0, EventType::PaperRustle, 5));
        assert_eq!(
            validate_classroom(&config),
            Err(ValidationError::EventOutOfGrid {
                index: 1,
                row: 3,
                col: 0
            })
        );

        let mut config = sample_classroom();
        config.events[0].seat_id = "2-2".to_string();
        assert!(matches!(
            validate_classroom(&config),
            Err(ValidationError::EventSeatMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn events_on_seats_vacated_later_stay_valid() {
        let mut config = sample_classroom();
        assert!(config.set_seat_status(1, 1, TemplateStatus::Empty));
        assert!(validate_classroom(&config).is_ok());

        let path = temp_file("classroom-store-vacated");
        {
            let mut store = JsonFileClassroomStore::new(path.clone());
            store.put(config.clone()).expect("put");
        }
        let reopened = JsonFileClassroomStore::new(path.clone());
        assert_eq!(reopened.get(&config.id), Some(config.clone()));

        let mut engine = SimulationEngine::from_classroom(&config, 3);
        let before = engine.seat_detail("1-1").cloned();
        engine.start();
        for _ in 0..30 {
            engine.tick();
        }
        assert_eq!(engine.alerts().len(), 1);
        assert_eq!(engine.alerts()[0].student_id, "R2C2");
        assert_eq!(engine.seat_detail("1-1").cloned(), before);
        let _ = fs::remove_dir_all(path.parent().expect("parent dir"));
    }

    #[test]
    fn memory_store_crud_keeps_insertion_order() {
        let mut store = MemoryClassroomStore::new();
        let first = sample_classroom();
        let second = ClassroomConfig::blank("Lab", 2, 3, "admin-2");
        store.put(first.clone()).expect("first put");
        store.put(second.clone()).expect("second put");
        let ids: Vec<String> = store.list().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![first.id.clone(), second.id.clone()]);

        let mut renamed = first.clone();
        renamed.name = "Hall C".to_string();
        store.put(renamed).expect("replace");
        assert_eq!(store.list().len(), 2);
        assert_eq!(store.get(&first.id).map(|c| c.name), Some("Hall C".to_string()));

        assert!(store.delete(&first.id).expect("delete"));
        assert!(!store.delete(&first.id).expect("second delete"));
        assert!(store.get(&first.id).is_none());
    }

    #[test]
    fn store_rejects_invalid_classroom() {
        let mut store = MemoryClassroomStore::new();
        let mut config = sample_classroom();
        config.cols = 1;
        assert!(matches!(store.put(config), Err(StoreError::Invalid(_))));
        assert!(store.list().is_empty());
    }

    #[test]
    fn json_store_persists_across_instances() {
        let path = temp_file("classroom-store-roundtrip");
        let config = sample_classroom();
        {
            let mut store = JsonFileClassroomStore::new(path.clone());
            store.put(config.clone()).expect("put");
        }
        let mut reopened = JsonFileClassroomStore::new(path.clone());
        assert_eq!(reopened.get(&config.id), Some(config.clone()));

        assert!(reopened.delete(&config.id).expect("delete"));
        let again = JsonFileClassroomStore::new(path.clone());
        assert!(again.list().is_empty());
        let _ = fs::remove_dir_all(path.parent().expect("parent dir"));
    }

    #[test]
    fn json_store_skips_invalid_entries_on_load() {
        let path = temp_file("classroom-store-lenient");
        fs::create_dir_all(path.parent().expect("parent dir")).expect("mkdir");
        let good = sample_classroom();
        let mut bad = sample_classroom();
        bad.rows = 40;
        let text = serde_json::json!({
            "version": 1,
            "classrooms": [good, bad, {"id": 3}],
        });
        fs::write(&path, text.to_string()).expect("write fixture");

        let store = JsonFileClassroomStore::new(path.clone());
        assert_eq!(store.list().len(), 1);
        let _ = fs::remove_dir_all(path.parent().expect("parent dir"));
    }

    #[test]
    fn json_store_starts_empty_for_missing_or_garbled_file() {
        let missing = JsonFileClassroomStore::new(temp_file("classroom-store-missing"));
        assert!(missing.list().is_empty());

        let path = temp_file("classroom-store-garbled");
        fs::create_dir_all(path.parent().expect("parent dir")).expect("mkdir");
        fs::write(&path, "{not json").expect("write fixture");
        assert!(JsonFileClassroomStore::new(path.clone()).list().is_empty());
        let _ = fs::remove_dir_all(path.parent().expect("parent dir"));
    }

    #[test]
    fn stored_classroom_drives_a_session() {
        let config = sample_classroom();
        let mut engine = SimulationEngine::from_classroom(&config, 4);
        let vacant: Vec<&str> = engine
            .seats()
            .iter()
            .filter(|s| s.status == SeatStatus::Empty)
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(vacant, vec!["0-0", "2-3"]);

        engine.start();
        for _ in 0..30 {
            engine.tick();
        }
        assert_eq!(engine.alerts().len(), 1);
        assert_eq!(engine.alerts()[0].student_id, "STU-006");
    }
}
