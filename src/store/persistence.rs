use log::{debug, info, warn};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::engine::{IpFilterEngine, ResolveMode};
use crate::models::config::AppConfig;
use crate::models::filter::FilterState;
use crate::store::facility::{Facility, FILTER_FACILITY_ID};
use crate::store::snapshot::{self, SNAPSHOT_LEN};
use crate::utils::error::{FilterError, FilterResult};

/// Result of loading the persisted filter state
#[derive(Debug)]
pub struct LoadedState {
    /// Restored state, or defaults when nothing usable was stored
    pub state: FilterState,

    /// Set when a stored IP filter could not be reloaded; the state still
    /// names the filter but its rules are the stale stored copy
    pub resolve_error: Option<FilterError>,
}

/// Reads and writes the filter state file
#[derive(Debug, Clone)]
pub struct FilterStore {
    /// Persisted state file
    state_file: PathBuf,

    /// Markers serializing writers across instances
    facility: Facility,
}

impl FilterStore {
    pub fn new(state_file: impl Into<PathBuf>, facility: Facility) -> Self {
        Self {
            state_file: state_file.into(),
            facility,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.state_file.clone(), Facility::new(config.lock_dir.clone()))
    }

    pub fn state_file(&self) -> &Path {
        &self.state_file
    }

    /// Restore the saved state.
    ///
    /// Never fails: a missing or unreadable file yields the default state.
    /// An applied IP filter is reloaded by name through `engine`.
    pub fn load<E>(&self, engine: &mut E) -> LoadedState
    where
        E: IpFilterEngine + ?Sized,
    {
        let mut state = self.read_state();

        let resolve_error = match state.ip_filter_name().cloned() {
            Some(name) => match engine.load_by_name(name.as_str(), ResolveMode::Resolve) {
                Ok(rules) => {
                    debug!("Reloaded IP filter '{}' ({} bytes)", name, rules.len());
                    state.replace_ip_filter_rules(rules);
                    None
                }
                Err(e) => {
                    warn!("Unable to reload IP filter '{}': {:#}", name, e);
                    Some(FilterError::FilterReResolutionFailed {
                        name: name.to_string(),
                        reason: format!("{:#}", e),
                    })
                }
            },
            None => None,
        };

        LoadedState {
            state,
            resolve_error,
        }
    }

    fn read_state(&self) -> FilterState {
        let file = match File::open(&self.state_file) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(
                    "No filter state at {}, using defaults",
                    self.state_file.display()
                );
                return FilterState::new();
            }
            Err(e) => {
                warn!(
                    "Unable to open filter state {}: {}; using defaults",
                    self.state_file.display(),
                    e
                );
                return FilterState::new();
            }
        };

        // One byte past a snapshot is enough to tell an oversized file
        let mut buf = Vec::with_capacity(SNAPSHOT_LEN + 1);
        if let Err(e) = file.take(SNAPSHOT_LEN as u64 + 1).read_to_end(&mut buf) {
            warn!(
                "Unable to read filter state {}: {}; using defaults",
                self.state_file.display(),
                e
            );
            return FilterState::new();
        }

        match snapshot::decode(&buf) {
            Ok(state) => state,
            Err(e) => {
                warn!(
                    "Discarding filter state {}: {}",
                    self.state_file.display(),
                    e
                );
                FilterState::new()
            }
        }
    }

    /// Write `state` to the state file.
    ///
    /// Fails with [`FilterError::StoreBusy`] without touching the file when
    /// another instance is writing. The facility marker never outlives the
    /// call.
    pub fn save(&self, state: &FilterState) -> FilterResult<()> {
        let image = snapshot::encode(state);

        let mark = match self
            .facility
            .try_mark(FILTER_FACILITY_ID, "Filter configuration change")?
        {
            Some(mark) => mark,
            None => {
                warn!(
                    "Filter state is being changed by another instance: {}",
                    self.facility
                        .holder(FILTER_FACILITY_ID)
                        .unwrap_or_default()
                        .replace('\n', " ")
                );
                return Err(FilterError::StoreBusy);
            }
        };

        let result = self.write_state(&image);

        if let Err(e) = mark.release() {
            warn!("Failed to release filter state marker: {}", e);
        }
        result
    }

    fn write_state(&self, image: &[u8]) -> FilterResult<()> {
        if let Some(parent) = self.state_file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.state_file)?;
        write_snapshot(&mut file, image)?;
        file.sync_all()?;

        info!("Saved filter state to {}", self.state_file.display());
        Ok(())
    }
}

/// Single write of a whole snapshot; anything less is a short write
fn write_snapshot<W: Write>(writer: &mut W, image: &[u8]) -> FilterResult<()> {
    let written = writer.write(image)?;
    if written < image.len() {
        return Err(FilterError::ShortWrite {
            written,
            expected: image.len(),
        });
    }
    writer.flush()?;
    Ok(())
}
