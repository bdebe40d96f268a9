//! Locations of the two record sets

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::null_handling::NullConfig;

/// File name of the flat record set inside a data directory
pub const CSV_FILE_NAME: &str = "paralympics.csv";

/// File name of the relational database inside a data directory
pub const DB_FILE_NAME: &str = "paralympics.db";

/// Where the dashboard reads its data from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Flat per-edition CSV file
    pub csv_path: PathBuf,

    /// SQLite database holding `event`, `host` and `host_event`
    pub db_path: PathBuf,

    /// Cells in the CSV treated as absent
    pub null_config: NullConfig,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::in_dir("data")
    }
}

impl SourceConfig {
    pub fn new(csv_path: impl Into<PathBuf>, db_path: impl Into<PathBuf>) -> Self {
        Self {
            csv_path: csv_path.into(),
            db_path: db_path.into(),
            null_config: NullConfig::default(),
        }
    }

    /// Both files under one directory, using the conventional file names
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(CSV_FILE_NAME), dir.join(DB_FILE_NAME))
    }
}
