/// Configuration for catalog imports
use crate::error::ImportError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Room type assigned to rooms whose feed entry has no `type`
pub const DEFAULT_ROOM_TYPE: &str = "CLASS";

/// Settings for an import run.
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub default_room_type: String,
    pub placeholders: PlaceholderRefs,
}

/// Teacher, group and subject ids written on every imported class.
///
/// The feeds carry no directory of teachers, groups or subjects yet, so
/// classes point at these fixed rows until a real lookup exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderRefs {
    pub teacher_id: i64,
    pub group_id: i64,
    pub subject_id: i64,
}

impl Default for PlaceholderRefs {
    fn default() -> Self {
        Self {
            teacher_id: 1,
            group_id: 1,
            subject_id: 1,
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            default_room_type: DEFAULT_ROOM_TYPE.to_string(),
            placeholders: PlaceholderRefs::default(),
        }
    }
}

impl ImportConfig {
    /// Loads an import config from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, ImportError> {
        let content = fs::read_to_string(path).map_err(|e| ImportError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ImportError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: ImportConfig =
            serde_json::from_str(r#"{"placeholders": {"teacher_id": 7}}"#).unwrap();

        assert_eq!(config.default_room_type, "CLASS");
        assert_eq!(config.placeholders.teacher_id, 7);
        assert_eq!(config.placeholders.group_id, 1);
        assert_eq!(config.placeholders.subject_id, 1);
    }

    #[test]
    fn test_missing_config_file() {
        let err = ImportConfig::load_from_file(Path::new("/nonexistent/roomcat.json")).unwrap_err();
        assert!(matches!(err, ImportError::Config { .. }));
        assert!(err.is_feed_error());
    }
}
