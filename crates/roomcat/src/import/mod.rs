/// Feed import pipeline: room types, features, buildings and rooms, then classes

mod feeds;
mod reconcile;
mod report;
mod room_code;

pub use feeds::{
    BuildingRecord, ClassRecord, CodeNameRecord, FeedPaths, Feeds, RoomRecord, CLASSES_FILE,
    FEATURES_FILE, ROOMS_FILE, ROOM_TYPES_FILE,
};
pub use reconcile::{ClassOutcome, ClassReconciler, SkipReason};
pub use report::{ImportReport, SkippedClass, SkippedRoom, UpsertTally};
pub use room_code::{parse_room_code, RoomCode, RoomCodeError};

use crate::config::ImportConfig;
use crate::db::{
    CatalogDb, DbBuilding, DbFeature, DbRoomType, NewRoom, ReferenceDefaults, ReferenceEntity,
};
use crate::error::ImportError;
use std::collections::HashMap;
use tracing::{info, warn};

/// Loads the feeds at `paths` and imports them into `db`.
///
/// All four feeds are parsed before the first write.
pub fn import_from_paths(
    paths: &FeedPaths,
    db: &CatalogDb,
    config: &ImportConfig,
) -> Result<ImportReport, ImportError> {
    let feeds = Feeds::load(paths)?;
    run_import(&feeds, db, config)
}

/// Imports already-loaded feeds into `db`.
///
/// Stages run in dependency order and each write is committed as it happens,
/// so a fatal error leaves everything written by earlier records in place.
/// Note that rooms are always inserted: importing the same rooms feed twice
/// yields duplicate rooms, while classes are deduplicated.
pub fn run_import(
    feeds: &Feeds,
    db: &CatalogDb,
    config: &ImportConfig,
) -> Result<ImportReport, ImportError> {
    let mut report = ImportReport::default();

    info!("Importing {} room types", feeds.room_types.len());
    let room_types =
        upsert_reference::<DbRoomType>(db, &feeds.room_types, &mut report.room_types)?;

    info!("Importing {} features", feeds.features.len());
    let features = upsert_reference::<DbFeature>(db, &feeds.features, &mut report.features)?;

    info!("Importing {} buildings", feeds.buildings.len());
    import_buildings(db, &feeds.buildings, &room_types, &features, config, &mut report)?;

    info!("Importing {} classes", feeds.classes.len());
    let reconciler = ClassReconciler::new(db, config.placeholders);
    for record in &feeds.classes {
        let outcome = reconciler.reconcile(record)?;
        report.record_class(&record.room, outcome);
    }

    report.log_summary();
    Ok(report)
}

/// Upserts every record by code and returns the entities keyed by code
fn upsert_reference<E: ReferenceEntity>(
    db: &CatalogDb,
    records: &[CodeNameRecord],
    tally: &mut UpsertTally,
) -> Result<HashMap<String, E>, ImportError> {
    let mut by_code = HashMap::with_capacity(records.len());

    for record in records {
        let upsert = db.get_or_create::<E>(&record.code, &ReferenceDefaults::named(&record.name))?;
        tally.record(&upsert);

        let entity = upsert.into_inner();
        by_code.insert(entity.code().to_string(), entity);
    }

    Ok(by_code)
}

fn import_buildings(
    db: &CatalogDb,
    buildings: &[BuildingRecord],
    room_types: &HashMap<String, DbRoomType>,
    features: &HashMap<String, DbFeature>,
    config: &ImportConfig,
    report: &mut ImportReport,
) -> Result<(), ImportError> {
    for record in buildings {
        let upsert =
            db.get_or_create::<DbBuilding>(&record.code, &ReferenceDefaults::named(&record.name))?;
        report.buildings.record(&upsert);
        let building = upsert.into_inner();

        for room in &record.rooms {
            let type_code = room
                .room_type
                .as_deref()
                .unwrap_or(&config.default_room_type);

            let Some(room_type) = room_types.get(type_code) else {
                warn!(
                    building = %building.code,
                    floor = room.floor,
                    number = room.number,
                    "Skipping room with unknown room type {type_code}"
                );
                report.rooms_skipped.push(SkippedRoom {
                    building: building.code.clone(),
                    floor: room.floor,
                    number: room.number,
                    reason: format!("unknown room type '{type_code}'"),
                });
                continue;
            };

            let created = db.create_room(&NewRoom {
                building_id: building.id,
                type_id: room_type.id,
                number: room.number,
                floor: room.floor,
                capacity: room.capacity,
                name: room.name.clone(),
                is_open: room.is_open,
                path: room.path.clone(),
            })?;

            // Feature codes missing from the features feed are dropped silently
            let feature_ids: Vec<i64> = room
                .features
                .iter()
                .filter_map(|code| features.get(code))
                .map(|feature| feature.id)
                .collect();
            db.set_room_features(created.id, &feature_ids)?;

            report.rooms_created += 1;
        }
    }

    Ok(())
}
