//! Get-or-create for reference data keyed by a unique code.
//!
//! Buildings, room types and features share the same shape (`id`, `code`,
//! `name`) and the same rule: the code is the single source of truth for
//! whether the entity already exists.

use super::types::{DbBuilding, DbFeature, DbRoomType};
use super::CatalogDb;
use crate::error::CatalogError;
use rusqlite::{Connection, Row};
use tracing::{debug, warn};

/// A catalog entity identified by a globally unique code.
pub trait ReferenceEntity: Sized {
    /// Backing table; must expose `id`, `code` and `name` columns
    const TABLE: &'static str;
    /// Human-readable kind used in log lines
    const KIND: &'static str;

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
    fn id(&self) -> i64;
    fn code(&self) -> &str;
}

/// Fields applied only when the entity has to be created.
#[derive(Debug, Clone, Default)]
pub struct ReferenceDefaults {
    pub name: String,
}

impl ReferenceDefaults {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Result of [`CatalogDb::get_or_create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upsert<E> {
    Existing(E),
    Created(E),
}

impl<E> Upsert<E> {
    pub fn was_created(&self) -> bool {
        matches!(self, Upsert::Created(_))
    }

    pub fn get(&self) -> &E {
        match self {
            Upsert::Existing(e) | Upsert::Created(e) => e,
        }
    }

    pub fn into_inner(self) -> E {
        match self {
            Upsert::Existing(e) | Upsert::Created(e) => e,
        }
    }
}

macro_rules! reference_entity {
    ($ty:ty, $table:literal, $kind:literal) => {
        impl ReferenceEntity for $ty {
            const TABLE: &'static str = $table;
            const KIND: &'static str = $kind;

            fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
                Ok(Self {
                    id: row.get(0)?,
                    code: row.get(1)?,
                    name: row.get(2)?,
                })
            }

            fn id(&self) -> i64 {
                self.id
            }

            fn code(&self) -> &str {
                &self.code
            }
        }
    };
}

reference_entity!(DbBuilding, "buildings", "building");
reference_entity!(DbRoomType, "room_types", "room type");
reference_entity!(DbFeature, "features", "feature");

impl CatalogDb {
    /// Returns the entity with the given code, creating it from `defaults` if absent.
    ///
    /// A created row is committed before this returns, so later lookups in the
    /// same run see it. If the store somehow holds several rows with the code,
    /// the oldest one wins and the inconsistency is logged.
    pub fn get_or_create<E: ReferenceEntity>(
        &self,
        code: &str,
        defaults: &ReferenceDefaults,
    ) -> Result<Upsert<E>, CatalogError> {
        let db = self.conn()?;

        if let Some(existing) = select_by_code::<E>(&db, code)? {
            return Ok(Upsert::Existing(existing));
        }

        db.execute(
            &format!("INSERT INTO {} (code, name) VALUES (?1, ?2)", E::TABLE),
            (code, &defaults.name),
        )?;
        let id = db.last_insert_rowid();

        let created = db.query_row(
            &format!("SELECT id, code, name FROM {} WHERE id = ?1", E::TABLE),
            [id],
            E::from_row,
        )?;

        debug!(kind = E::KIND, code, id, "Created reference entity");
        Ok(Upsert::Created(created))
    }

    /// Looks up a reference entity by code without creating it
    pub fn find_by_code<E: ReferenceEntity>(&self, code: &str) -> Result<Option<E>, CatalogError> {
        let db = self.conn()?;
        Ok(select_by_code::<E>(&db, code)?)
    }
}

fn select_by_code<E: ReferenceEntity>(db: &Connection, code: &str) -> rusqlite::Result<Option<E>> {
    let mut stmt = db.prepare(&format!(
        "SELECT id, code, name FROM {} WHERE code = ?1 ORDER BY id",
        E::TABLE
    ))?;

    let matches = stmt
        .query_map([code], E::from_row)?
        .collect::<rusqlite::Result<Vec<E>>>()?;

    if matches.len() > 1 {
        warn!(
            kind = E::KIND,
            code,
            count = matches.len(),
            "Multiple rows share a unique code, using the oldest"
        );
    }

    Ok(matches.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_is_idempotent() {
        let db = CatalogDb::open_in_memory().unwrap();

        let first = db
            .get_or_create::<DbBuilding>("M", &ReferenceDefaults::named("Main"))
            .unwrap();
        let second = db
            .get_or_create::<DbBuilding>("M", &ReferenceDefaults::named("Ignored"))
            .unwrap();

        assert!(first.was_created());
        assert!(!second.was_created());
        assert_eq!(first.get().id, second.get().id);
        // Defaults only apply on creation
        assert_eq!(second.into_inner().name, "Main");
        assert_eq!(db.catalog_counts().unwrap().buildings, 1);
    }

    #[test]
    fn test_kinds_do_not_share_codes() {
        let db = CatalogDb::open_in_memory().unwrap();

        let room_type = db
            .get_or_create::<DbRoomType>("LAB", &ReferenceDefaults::named("Laboratory"))
            .unwrap();
        let feature = db
            .get_or_create::<DbFeature>("LAB", &ReferenceDefaults::named("Lab bench"))
            .unwrap();

        assert!(room_type.was_created());
        assert!(feature.was_created());
        assert_eq!(feature.get().code(), "LAB");
    }

    #[test]
    fn test_find_by_code_does_not_create() {
        let db = CatalogDb::open_in_memory().unwrap();

        assert!(db.find_by_code::<DbFeature>("PROJ").unwrap().is_none());
        assert_eq!(db.catalog_counts().unwrap().features, 0);
    }
}
