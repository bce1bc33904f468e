/// Database module for the campus room catalog

mod reference;
mod types;

pub use reference::{ReferenceDefaults, ReferenceEntity, Upsert};
pub use types::{
    CatalogCounts, DbBuilding, DbClass, DbFeature, DbRoom, DbRoomType, NewClass, NewRoom,
    Recurrence,
};

use crate::error::CatalogError;
use chrono::{NaiveTime, Weekday};
use rusqlite::{Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

const SCHEMA_SQL: &str = include_str!("../../../../sql/init_catalog.sql");

const ROOM_COLUMNS: &str =
    "id, building_id, type_id, number, floor, capacity, name, is_open, path";

const CLASS_COLUMNS: &str = "id, room_id, teacher_id, group_id, subject_id, start_date, \
     end_date, start_time, end_time, recurrence, weekday";

/// Handle to the catalog store.
///
/// Every statement runs in SQLite autocommit mode, so a write is durable as
/// soon as the call that made it returns.
pub struct CatalogDb {
    db: Mutex<Connection>,
}

impl CatalogDb {
    /// Opens (or creates) the catalog at `db_path` and applies the schema
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        Self::init(Connection::open(db_path)?)
    }

    /// Opens a throwaway in-memory catalog
    pub fn open_in_memory() -> Result<Self, CatalogError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, CatalogError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA_SQL)?;

        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, CatalogError> {
        self.db.lock().map_err(|_| CatalogError::LockPoisoned)
    }

    /// Looks up a building by its code
    pub fn find_building_by_code(&self, code: &str) -> Result<Option<DbBuilding>, CatalogError> {
        self.find_by_code::<DbBuilding>(code)
    }

    /// Inserts a room unconditionally and returns the stored row
    pub fn create_room(&self, room: &NewRoom) -> Result<DbRoom, CatalogError> {
        let db = self.conn()?;
        db.execute(
            "INSERT INTO rooms (building_id, type_id, number, floor, capacity, name, is_open, path)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            (
                room.building_id,
                room.type_id,
                room.number,
                room.floor,
                room.capacity,
                &room.name,
                room.is_open,
                &room.path,
            ),
        )?;
        let id = db.last_insert_rowid();

        Ok(db.query_row(
            &format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = ?1"),
            [id],
            room_from_row,
        )?)
    }

    /// Finds a room by its location within a building.
    ///
    /// The store does not enforce uniqueness of the triple; when several rooms
    /// match, the oldest is returned and the duplication is logged.
    pub fn find_room(
        &self,
        building_id: i64,
        floor: i64,
        number: i64,
    ) -> Result<Option<DbRoom>, CatalogError> {
        let db = self.conn()?;
        let mut stmt = db.prepare(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms
             WHERE building_id = ?1 AND floor = ?2 AND number = ?3
             ORDER BY id"
        ))?;

        let rooms = stmt
            .query_map((building_id, floor, number), room_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        if rooms.len() > 1 {
            warn!(
                building_id,
                floor,
                number,
                count = rooms.len(),
                "Duplicate rooms at the same location, using the oldest"
            );
        }

        Ok(rooms.into_iter().next())
    }

    /// Gets all rooms of a building, oldest first
    pub fn rooms_in_building(&self, building_id: i64) -> Result<Vec<DbRoom>, CatalogError> {
        let db = self.conn()?;
        let mut stmt = db.prepare(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms WHERE building_id = ?1 ORDER BY id"
        ))?;

        let rooms = stmt
            .query_map([building_id], room_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rooms)
    }

    /// Replaces the feature set of a room
    pub fn set_room_features(&self, room_id: i64, feature_ids: &[i64]) -> Result<(), CatalogError> {
        let mut db = self.conn()?;
        let tx = db.transaction()?;

        tx.execute("DELETE FROM room_features WHERE room_id = ?1", [room_id])?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO room_features (room_id, feature_id) VALUES (?1, ?2)",
            )?;
            for feature_id in feature_ids {
                stmt.execute((room_id, feature_id))?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Gets the feature codes assigned to a room, sorted
    pub fn room_feature_codes(&self, room_id: i64) -> Result<Vec<String>, CatalogError> {
        let db = self.conn()?;
        let mut stmt = db.prepare(
            "SELECT f.code FROM features f
             JOIN room_features rf ON rf.feature_id = f.id
             WHERE rf.room_id = ?1
             ORDER BY f.code",
        )?;

        let codes = stmt
            .query_map([room_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;

        Ok(codes)
    }

    /// Finds the class occupying `room_id` at `start_time` on `weekday`, if any
    pub fn find_class(
        &self,
        room_id: i64,
        start_time: NaiveTime,
        weekday: Weekday,
    ) -> Result<Option<DbClass>, CatalogError> {
        let db = self.conn()?;
        let mut stmt = db.prepare(&format!(
            "SELECT {CLASS_COLUMNS} FROM classes
             WHERE room_id = ?1 AND start_time = ?2 AND weekday = ?3
             ORDER BY id
             LIMIT 1"
        ))?;

        let mut rows = stmt.query_map(
            (room_id, start_time, weekday.num_days_from_monday()),
            class_from_row,
        )?;

        Ok(rows.next().transpose()?)
    }

    /// Inserts a class and returns the stored row
    pub fn create_class(&self, class: &NewClass) -> Result<DbClass, CatalogError> {
        let db = self.conn()?;
        db.execute(
            "INSERT INTO classes (
                room_id, teacher_id, group_id, subject_id, start_date, end_date,
                start_time, end_time, recurrence, weekday
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            (
                class.room_id,
                class.teacher_id,
                class.group_id,
                class.subject_id,
                class.start_date,
                class.end_date,
                class.start_time,
                class.end_time,
                class.recurrence,
                class.weekday.num_days_from_monday(),
            ),
        )?;
        let id = db.last_insert_rowid();

        Ok(db.query_row(
            &format!("SELECT {CLASS_COLUMNS} FROM classes WHERE id = ?1"),
            [id],
            class_from_row,
        )?)
    }

    /// Gets all classes held in a room, ordered by weekday then start time
    pub fn classes_in_room(&self, room_id: i64) -> Result<Vec<DbClass>, CatalogError> {
        let db = self.conn()?;
        let mut stmt = db.prepare(&format!(
            "SELECT {CLASS_COLUMNS} FROM classes
             WHERE room_id = ?1
             ORDER BY weekday, start_time, id"
        ))?;

        let classes = stmt
            .query_map([room_id], class_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(classes)
    }

    /// Counts rows in every catalog table
    pub fn catalog_counts(&self) -> Result<CatalogCounts, CatalogError> {
        let db = self.conn()?;
        let count = |table: &str| -> rusqlite::Result<i64> {
            db.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
        };

        Ok(CatalogCounts {
            buildings: count("buildings")?,
            room_types: count("room_types")?,
            features: count("features")?,
            rooms: count("rooms")?,
            classes: count("classes")?,
        })
    }
}

fn room_from_row(row: &Row<'_>) -> rusqlite::Result<DbRoom> {
    Ok(DbRoom {
        id: row.get(0)?,
        building_id: row.get(1)?,
        type_id: row.get(2)?,
        number: row.get(3)?,
        floor: row.get(4)?,
        capacity: row.get(5)?,
        name: row.get(6)?,
        is_open: row.get(7)?,
        path: row.get(8)?,
    })
}

fn class_from_row(row: &Row<'_>) -> rusqlite::Result<DbClass> {
    let weekday: u8 = row.get(10)?;
    let weekday = Weekday::try_from(weekday).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(10, rusqlite::types::Type::Integer, Box::new(e))
    })?;

    Ok(DbClass {
        id: row.get(0)?,
        room_id: row.get(1)?,
        teacher_id: row.get(2)?,
        group_id: row.get(3)?,
        subject_id: row.get(4)?,
        start_date: row.get(5)?,
        end_date: row.get(6)?,
        start_time: row.get(7)?,
        end_time: row.get(8)?,
        recurrence: row.get(9)?,
        weekday,
    })
}
