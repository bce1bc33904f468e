//! Campus room catalog: buildings, room types, features, rooms and the
//! scheduled classes that occupy them, plus the pipeline that imports them
//! from JSON feeds.

pub mod config;
pub mod db;
pub mod error;
pub mod import;

pub use config::{ImportConfig, PlaceholderRefs};
pub use db::CatalogDb;
pub use error::{CatalogError, ImportError};
pub use import::{import_from_paths, run_import, FeedPaths, Feeds, ImportReport};
