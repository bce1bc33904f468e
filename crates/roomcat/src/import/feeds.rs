//! JSON feed documents and their loading.

use crate::db::Recurrence;
use crate::error::ImportError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const ROOM_TYPES_FILE: &str = "room_types.json";
pub const FEATURES_FILE: &str = "features.json";
pub const ROOMS_FILE: &str = "rooms.json";
pub const CLASSES_FILE: &str = "classes.json";

/// Entry of `room_types.json` or `features.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeNameRecord {
    pub code: String,
    pub name: String,
}

/// Entry of `rooms.json`: a building with its rooms nested inside
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingRecord {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub rooms: Vec<RoomRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    pub number: i64,
    pub floor: i64,
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub room_type: Option<String>,
    #[serde(default = "default_is_open")]
    pub is_open: bool,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub features: Vec<String>,
}

fn default_is_open() -> bool {
    true
}

/// Entry of `classes.json`.
///
/// Dates and times stay as text here; they are parsed when the record is
/// reconciled against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    /// Compact room code, e.g. `M209`
    pub room: String,
    pub start_date: String,
    pub end_date: String,
    pub start_time: String,
    pub end_time: String,
    pub recurrence: Recurrence,
    /// 0 = Monday .. 6 = Sunday
    pub weekday: i64,
}

/// Locations of the four feed documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPaths {
    pub room_types: PathBuf,
    pub features: PathBuf,
    pub rooms: PathBuf,
    pub classes: PathBuf,
}

impl FeedPaths {
    /// Uses the standard file names inside `dir`
    pub fn from_dir(dir: &Path) -> Self {
        Self {
            room_types: dir.join(ROOM_TYPES_FILE),
            features: dir.join(FEATURES_FILE),
            rooms: dir.join(ROOMS_FILE),
            classes: dir.join(CLASSES_FILE),
        }
    }
}

/// All four feeds, fully parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feeds {
    pub room_types: Vec<CodeNameRecord>,
    pub features: Vec<CodeNameRecord>,
    pub buildings: Vec<BuildingRecord>,
    pub classes: Vec<ClassRecord>,
}

impl Feeds {
    /// Reads and parses every feed.
    ///
    /// Nothing is written anywhere, so a failure here leaves the catalog untouched.
    pub fn load(paths: &FeedPaths) -> Result<Self, ImportError> {
        let feeds = Self {
            room_types: read_feed(&paths.room_types)?,
            features: read_feed(&paths.features)?,
            buildings: read_feed(&paths.rooms)?,
            classes: read_feed(&paths.classes)?,
        };

        info!(
            room_types = feeds.room_types.len(),
            features = feeds.features.len(),
            buildings = feeds.buildings.len(),
            classes = feeds.classes.len(),
            "Loaded import feeds"
        );

        Ok(feeds)
    }
}

fn read_feed<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ImportError> {
    let content = fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| ImportError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_record_defaults() {
        let building: BuildingRecord = serde_json::from_str(
            r#"{"code": "M", "name": "Main", "rooms": [{"number": 9, "floor": 2}]}"#,
        )
        .unwrap();

        let room = &building.rooms[0];
        assert_eq!(room.room_type, None);
        assert!(room.is_open);
        assert_eq!(room.path, "");
        assert!(room.features.is_empty());
        assert_eq!(room.capacity, None);
    }

    #[test]
    fn test_building_without_rooms() {
        let building: BuildingRecord =
            serde_json::from_str(r#"{"code": "L", "name": "Library"}"#).unwrap();
        assert!(building.rooms.is_empty());
    }

    #[test]
    fn test_class_record_recurrence() {
        let class: ClassRecord = serde_json::from_str(
            r#"{"room": "M209", "start_date": "2024-01-01", "end_date": "2024-06-01",
                "start_time": "08:00:00", "end_time": "09:00:00",
                "recurrence": "WEEKLY", "weekday": 0}"#,
        )
        .unwrap();
        assert_eq!(class.recurrence, Recurrence::Weekly);

        let bad = serde_json::from_str::<ClassRecord>(
            r#"{"room": "M209", "start_date": "2024-01-01", "end_date": "2024-06-01",
                "start_time": "08:00:00", "end_time": "09:00:00",
                "recurrence": "HOURLY", "weekday": 0}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_missing_feed_is_io_error() {
        let paths = FeedPaths::from_dir(Path::new("/nonexistent/feeds"));
        let err = Feeds::load(&paths).unwrap_err();
        assert!(matches!(err, ImportError::Io { .. }));
    }
}
