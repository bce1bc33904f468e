//! Summary of an import run.

use super::reconcile::{ClassOutcome, SkipReason};
use crate::db::Upsert;
use serde::Serialize;
use tracing::info;

/// Created/existing counts for one kind of reference entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsertTally {
    pub created: usize,
    pub existing: usize,
}

impl UpsertTally {
    pub fn record<E>(&mut self, upsert: &Upsert<E>) {
        if upsert.was_created() {
            self.created += 1;
        } else {
            self.existing += 1;
        }
    }
}

/// A room entry from the rooms feed that was not created
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRoom {
    pub building: String,
    pub floor: i64,
    pub number: i64,
    pub reason: String,
}

/// A class entry from the class feed that was not created
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedClass {
    pub room: String,
    pub reason: SkipReason,
}

/// What one import run did to the catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub room_types: UpsertTally,
    pub features: UpsertTally,
    pub buildings: UpsertTally,
    pub rooms_created: usize,
    pub rooms_skipped: Vec<SkippedRoom>,
    pub classes_created: usize,
    pub classes_skipped: Vec<SkippedClass>,
}

impl ImportReport {
    pub fn record_class(&mut self, room: &str, outcome: ClassOutcome) {
        match outcome {
            ClassOutcome::Created(_) => self.classes_created += 1,
            ClassOutcome::Skipped(reason) => self.classes_skipped.push(SkippedClass {
                room: room.to_string(),
                reason,
            }),
        }
    }

    /// Classes skipped because an equivalent one already existed
    pub fn duplicate_classes(&self) -> usize {
        self.classes_skipped
            .iter()
            .filter(|s| s.reason.is_duplicate())
            .count()
    }

    /// Classes skipped because their room could not be resolved
    pub fn unresolved_classes(&self) -> usize {
        self.classes_skipped.len() - self.duplicate_classes()
    }

    pub fn log_summary(&self) {
        info!(
            room_types_created = self.room_types.created,
            features_created = self.features.created,
            buildings_created = self.buildings.created,
            rooms_created = self.rooms_created,
            rooms_skipped = self.rooms_skipped.len(),
            classes_created = self.classes_created,
            classes_duplicate = self.duplicate_classes(),
            classes_unresolved = self.unresolved_classes(),
            "Import finished"
        );
    }
}
