use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default location of the persisted filter state
pub const DEFAULT_STATE_FILE: &str = "/var/lib/fltconf/filter.state";

/// Default directory holding facility markers
pub const DEFAULT_LOCK_DIR: &str = "/var/run/fltconf";

/// Default directory holding saved IP filter rule sets
pub const DEFAULT_FILTER_DIR: &str = "/var/lib/fltconf/filters";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Persisted filter state file
    pub state_file: PathBuf,

    /// Directory shared by all instances for facility markers
    pub lock_dir: PathBuf,

    /// Directory of named IP filter rule sets
    pub filter_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            lock_dir: PathBuf::from(DEFAULT_LOCK_DIR),
            filter_dir: PathBuf::from(DEFAULT_FILTER_DIR),
        }
    }
}
