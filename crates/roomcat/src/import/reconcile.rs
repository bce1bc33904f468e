//! Attaches scheduled classes from the class feed to catalog rooms.

use super::feeds::ClassRecord;
use super::room_code::{parse_room_code, RoomCodeError};
use crate::config::PlaceholderRefs;
use crate::db::{CatalogDb, NewClass, Recurrence};
use crate::error::ImportError;
use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

/// Terminal state of one class record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ClassOutcome {
    /// A new class row was written with this id
    Created(i64),
    Skipped(SkipReason),
}

/// Why a class record was not imported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    MalformedRoomCode { error: RoomCodeError },
    UnknownBuilding { building: String },
    UnknownRoom { room: String },
    /// The room already has a class at this start time and weekday
    Duplicate { existing_id: i64 },
}

impl SkipReason {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, SkipReason::Duplicate { .. })
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MalformedRoomCode { error } => write!(f, "malformed room code: {error}"),
            SkipReason::UnknownBuilding { building } => write!(f, "unknown building '{building}'"),
            SkipReason::UnknownRoom { room } => write!(f, "unknown room '{room}'"),
            SkipReason::Duplicate { existing_id } => {
                write!(f, "duplicate of class {existing_id}")
            }
        }
    }
}

/// Date and time fields of a class record, parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ClassSlot {
    start_date: NaiveDate,
    end_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    weekday: Weekday,
    recurrence: Recurrence,
}

impl ClassSlot {
    fn parse(record: &ClassRecord) -> Result<Self, ImportError> {
        Ok(Self {
            start_date: parse_date("start_date", &record.start_date)?,
            end_date: parse_date("end_date", &record.end_date)?,
            start_time: parse_time("start_time", &record.start_time)?,
            end_time: parse_time("end_time", &record.end_time)?,
            weekday: parse_weekday(record.weekday)?,
            recurrence: record.recurrence,
        })
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, ImportError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| ImportError::InvalidField {
        field,
        value: value.to_string(),
        expected: "YYYY-MM-DD",
    })
}

fn parse_time(field: &'static str, value: &str) -> Result<NaiveTime, ImportError> {
    NaiveTime::parse_from_str(value, TIME_FORMAT).map_err(|_| ImportError::InvalidField {
        field,
        value: value.to_string(),
        expected: "HH:MM:SS",
    })
}

fn parse_weekday(value: i64) -> Result<Weekday, ImportError> {
    u8::try_from(value)
        .ok()
        .and_then(|day| Weekday::try_from(day).ok())
        .ok_or_else(|| ImportError::InvalidField {
            field: "weekday",
            value: value.to_string(),
            expected: "0 (Monday) to 6 (Sunday)",
        })
}

/// Resolves class records to rooms and inserts the ones not yet scheduled.
pub struct ClassReconciler<'a> {
    db: &'a CatalogDb,
    placeholders: PlaceholderRefs,
}

impl<'a> ClassReconciler<'a> {
    pub fn new(db: &'a CatalogDb, placeholders: PlaceholderRefs) -> Self {
        Self { db, placeholders }
    }

    /// Runs one class record through the import steps.
    ///
    /// Unresolvable or duplicate records come back as [`ClassOutcome::Skipped`];
    /// only malformed dates/times and store failures are errors.
    pub fn reconcile(&self, record: &ClassRecord) -> Result<ClassOutcome, ImportError> {
        let code = match parse_room_code(&record.room) {
            Ok(code) => code,
            Err(error) => {
                warn!(room = %record.room, "Skipping class: {error}");
                return Ok(ClassOutcome::Skipped(SkipReason::MalformedRoomCode { error }));
            }
        };

        let Some(building) = self.db.find_building_by_code(&code.building)? else {
            warn!(room = %record.room, "Building {} not found", code.building);
            return Ok(ClassOutcome::Skipped(SkipReason::UnknownBuilding {
                building: code.building,
            }));
        };

        let Some(room) = self.db.find_room(building.id, code.floor, code.number)? else {
            warn!(room = %record.room, "Room {} not found in catalog", record.room);
            return Ok(ClassOutcome::Skipped(SkipReason::UnknownRoom {
                room: record.room.clone(),
            }));
        };

        let slot = ClassSlot::parse(record)?;

        if let Some(existing) = self.db.find_class(room.id, slot.start_time, slot.weekday)? {
            debug!(
                room = %record.room,
                class_id = existing.id,
                "Class already scheduled at {} on {}",
                slot.start_time,
                slot.weekday
            );
            return Ok(ClassOutcome::Skipped(SkipReason::Duplicate {
                existing_id: existing.id,
            }));
        }

        let created = self.db.create_class(&NewClass {
            room_id: room.id,
            teacher_id: self.placeholders.teacher_id,
            group_id: self.placeholders.group_id,
            subject_id: self.placeholders.subject_id,
            start_date: slot.start_date,
            end_date: slot.end_date,
            start_time: slot.start_time,
            end_time: slot.end_time,
            recurrence: slot.recurrence,
            weekday: slot.weekday,
        })?;

        Ok(ClassOutcome::Created(created.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DbBuilding, DbRoomType, NewRoom, ReferenceDefaults};

    fn catalog_with_room() -> (CatalogDb, i64) {
        let db = CatalogDb::open_in_memory().unwrap();
        let building = db
            .get_or_create::<DbBuilding>("M", &ReferenceDefaults::named("Main"))
            .unwrap()
            .into_inner();
        let room_type = db
            .get_or_create::<DbRoomType>("CLASS", &ReferenceDefaults::named("Classroom"))
            .unwrap()
            .into_inner();
        let room = db
            .create_room(&NewRoom {
                building_id: building.id,
                type_id: room_type.id,
                number: 9,
                floor: 2,
                capacity: None,
                name: None,
                is_open: true,
                path: String::new(),
            })
            .unwrap();
        (db, room.id)
    }

    fn record(room: &str) -> ClassRecord {
        ClassRecord {
            room: room.to_string(),
            start_date: "2024-01-01".to_string(),
            end_date: "2024-06-01".to_string(),
            start_time: "08:00:00".to_string(),
            end_time: "09:00:00".to_string(),
            recurrence: Recurrence::Weekly,
            weekday: 0,
        }
    }

    #[test]
    fn test_creates_then_skips_duplicate() {
        let (db, room_id) = catalog_with_room();
        let reconciler = ClassReconciler::new(&db, PlaceholderRefs::default());

        let first = reconciler.reconcile(&record("M209")).unwrap();
        let ClassOutcome::Created(class_id) = first.clone() else {
            panic!("expected a created class, got {first:?}");
        };

        // Same room, start time and weekday; other fields differ
        let mut again = record("M209");
        again.end_time = "10:00:00".to_string();
        again.recurrence = Recurrence::Biweekly;
        assert_eq!(
            reconciler.reconcile(&again).unwrap(),
            ClassOutcome::Skipped(SkipReason::Duplicate {
                existing_id: class_id
            })
        );
        assert_eq!(db.classes_in_room(room_id).unwrap().len(), 1);
    }

    #[test]
    fn test_different_weekday_is_not_duplicate() {
        let (db, room_id) = catalog_with_room();
        let reconciler = ClassReconciler::new(&db, PlaceholderRefs::default());

        let mut tuesday = record("M209");
        tuesday.weekday = 1;

        assert!(matches!(
            reconciler.reconcile(&record("M209")).unwrap(),
            ClassOutcome::Created(_)
        ));
        assert!(matches!(
            reconciler.reconcile(&tuesday).unwrap(),
            ClassOutcome::Created(_)
        ));
        assert_eq!(db.classes_in_room(room_id).unwrap().len(), 2);
    }

    #[test]
    fn test_unresolvable_rooms_are_skipped() {
        let (db, room_id) = catalog_with_room();
        let reconciler = ClassReconciler::new(&db, PlaceholderRefs::default());

        assert!(matches!(
            reconciler.reconcile(&record("X209")).unwrap(),
            ClassOutcome::Skipped(SkipReason::UnknownBuilding { ref building }) if building == "X"
        ));
        assert!(matches!(
            reconciler.reconcile(&record("M310")).unwrap(),
            ClassOutcome::Skipped(SkipReason::UnknownRoom { .. })
        ));
        assert!(matches!(
            reconciler.reconcile(&record("M9")).unwrap(),
            ClassOutcome::Skipped(SkipReason::MalformedRoomCode { .. })
        ));
        assert!(db.classes_in_room(room_id).unwrap().is_empty());
    }

    #[test]
    fn test_placeholders_are_injected() {
        let (db, room_id) = catalog_with_room();
        let placeholders = PlaceholderRefs {
            teacher_id: 4,
            group_id: 5,
            subject_id: 6,
        };
        ClassReconciler::new(&db, placeholders)
            .reconcile(&record("M209"))
            .unwrap();

        let class = &db.classes_in_room(room_id).unwrap()[0];
        assert_eq!((class.teacher_id, class.group_id, class.subject_id), (4, 5, 6));
        assert_eq!(class.weekday, Weekday::Mon);
        assert_eq!(class.start_date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn test_malformed_time_is_fatal() {
        let (db, _) = catalog_with_room();
        let reconciler = ClassReconciler::new(&db, PlaceholderRefs::default());

        let mut bad = record("M209");
        bad.start_time = "8am".to_string();
        assert!(matches!(
            reconciler.reconcile(&bad),
            Err(ImportError::InvalidField {
                field: "start_time",
                ..
            })
        ));

        let mut bad_day = record("M209");
        bad_day.weekday = 7;
        assert!(matches!(
            reconciler.reconcile(&bad_day),
            Err(ImportError::InvalidField { field: "weekday", .. })
        ));
    }
}
