//! Error types for the catalog store and the import pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the catalog store.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The underlying SQLite call failed
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A previous holder of the connection panicked
    #[error("Catalog connection lock poisoned")]
    LockPoisoned,
}

/// Errors that abort an import run.
///
/// Anything that only affects a single record is reported through the
/// [`ImportReport`](crate::import::ImportReport) instead.
#[derive(Debug, Error)]
pub enum ImportError {
    /// A feed file could not be read
    #[error("Failed to read feed {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A feed file is not the JSON document we expect
    #[error("Invalid JSON in feed {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A date, time or weekday value in the class feed is malformed
    #[error("Invalid {field} '{value}' (expected {expected})")]
    InvalidField {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    /// The import configuration file is unreadable or malformed
    #[error("Invalid import config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// The catalog store failed mid-run
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl ImportError {
    /// Returns true if the error was raised before anything was written.
    pub fn is_feed_error(&self) -> bool {
        matches!(
            self,
            ImportError::Io { .. } | ImportError::Json { .. } | ImportError::Config { .. }
        )
    }
}

impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::Catalog(CatalogError::Database(err))
    }
}
