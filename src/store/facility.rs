//! Named advisory markers shared by every running instance.
//!
//! A marker is a file in a common lock directory, created with
//! create-exclusive semantics so exactly one instance can hold it.

use chrono::Utc;
use log::{debug, warn};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::utils::error::FilterResult;

/// Identifier of the marker guarding the filter state file
pub const FILTER_FACILITY_ID: &str = "filterstate.lock";

/// Directory of facility markers
#[derive(Debug, Clone)]
pub struct Facility {
    dir: PathBuf,
}

impl Facility {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn marker_path(&self, id: &str) -> PathBuf {
        self.dir.join(id)
    }

    /// Whether some instance currently holds `id`
    pub fn is_active(&self, id: &str) -> bool {
        self.marker_path(id).exists()
    }

    /// Contents of the marker for `id`, if held
    pub fn holder(&self, id: &str) -> Option<String> {
        fs::read_to_string(self.marker_path(id)).ok()
    }

    /// Take the marker for `id` without waiting.
    ///
    /// Returns `Ok(None)` when another holder already has it. The returned
    /// guard removes the marker when released or dropped.
    pub fn try_mark(&self, id: &str, description: &str) -> FilterResult<Option<FacilityMark>> {
        fs::create_dir_all(&self.dir)?;
        let path = self.marker_path(id);

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!("Facility '{}' already marked", id);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let mark = FacilityMark {
            path,
            released: false,
        };
        writeln!(
            file,
            "pid={}\ndescription={}\nsince={}",
            std::process::id(),
            description,
            Utc::now().to_rfc3339()
        )?;

        debug!("Marked facility '{}' ({})", id, description);
        Ok(Some(mark))
    }
}

/// Held facility marker; removed exactly once
#[derive(Debug)]
pub struct FacilityMark {
    path: PathBuf,
    released: bool,
}

impl FacilityMark {
    /// Remove the marker now, reporting failure
    pub fn release(mut self) -> io::Result<()> {
        self.released = true;
        fs::remove_file(&self.path)
    }
}

impl Drop for FacilityMark {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Failed to remove facility marker {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_second_mark_fails_while_held() {
        let dir = tempdir().unwrap();
        let facility = Facility::new(dir.path());

        let mark = facility.try_mark("res", "first").unwrap();
        assert!(mark.is_some());
        assert!(facility.is_active("res"));
        assert!(facility.try_mark("res", "second").unwrap().is_none());
    }

    #[test]
    fn test_drop_releases_marker() {
        let dir = tempdir().unwrap();
        let facility = Facility::new(dir.path());

        {
            let _mark = facility.try_mark("res", "scoped").unwrap().unwrap();
            assert!(facility.is_active("res"));
        }
        assert!(!facility.is_active("res"));
        assert!(facility.try_mark("res", "again").unwrap().is_some());
    }

    #[test]
    fn test_explicit_release() {
        let dir = tempdir().unwrap();
        let facility = Facility::new(dir.path());

        let mark = facility.try_mark("res", "explicit").unwrap().unwrap();
        mark.release().unwrap();
        assert!(!facility.is_active("res"));
    }

    #[test]
    fn test_independent_handles_share_markers() {
        let dir = tempdir().unwrap();
        let first = Facility::new(dir.path());
        let second = Facility::new(dir.path());

        let _mark = first.try_mark("res", "instance one").unwrap().unwrap();
        assert!(second.try_mark("res", "instance two").unwrap().is_none());
        assert!(second.try_mark("other", "unrelated").unwrap().is_some());
    }

    #[test]
    fn test_marker_records_holder() {
        let dir = tempdir().unwrap();
        let facility = Facility::new(dir.path().join("nested"));

        let _mark = facility.try_mark("res", "Filter configuration change").unwrap().unwrap();
        let holder = facility.holder("res").unwrap();
        assert!(holder.contains(&format!("pid={}", std::process::id())));
        assert!(holder.contains("description=Filter configuration change"));
    }
}
