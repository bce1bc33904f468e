/// Database types for the room catalog

use chrono::{NaiveDate, NaiveTime, Weekday};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DbBuilding {
    pub id: i64,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DbRoomType {
    pub id: i64,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DbFeature {
    pub id: i64,
    pub code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DbRoom {
    pub id: i64,
    pub building_id: i64,
    pub type_id: i64,
    pub number: i64,
    pub floor: i64,
    pub capacity: Option<i64>,
    pub name: Option<String>,
    pub is_open: bool,
    pub path: String,
}

/// Insert payload for a room; the id is assigned by the store
#[derive(Debug, Clone)]
pub struct NewRoom {
    pub building_id: i64,
    pub type_id: i64,
    pub number: i64,
    pub floor: i64,
    pub capacity: Option<i64>,
    pub name: Option<String>,
    pub is_open: bool,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbClass {
    pub id: i64,
    pub room_id: i64,
    pub teacher_id: i64,
    pub group_id: i64,
    pub subject_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub recurrence: Recurrence,
    pub weekday: Weekday,
}

#[derive(Debug, Clone)]
pub struct NewClass {
    pub room_id: i64,
    pub teacher_id: i64,
    pub group_id: i64,
    pub subject_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub recurrence: Recurrence,
    pub weekday: Weekday,
}

/// How often a scheduled class repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Recurrence {
    Once,
    Daily,
    Weekly,
    Biweekly,
    Monthly,
}

impl Recurrence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recurrence::Once => "ONCE",
            Recurrence::Daily => "DAILY",
            Recurrence::Weekly => "WEEKLY",
            Recurrence::Biweekly => "BIWEEKLY",
            Recurrence::Monthly => "MONTHLY",
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Recurrence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ONCE" => Ok(Recurrence::Once),
            "DAILY" => Ok(Recurrence::Daily),
            "WEEKLY" => Ok(Recurrence::Weekly),
            "BIWEEKLY" => Ok(Recurrence::Biweekly),
            "MONTHLY" => Ok(Recurrence::Monthly),
            other => Err(format!("unknown recurrence '{other}'")),
        }
    }
}

impl ToSql for Recurrence {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Recurrence {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// Row counts per catalog table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogCounts {
    pub buildings: i64,
    pub room_types: i64,
    pub features: i64,
    pub rooms: i64,
    pub classes: i64,
}
