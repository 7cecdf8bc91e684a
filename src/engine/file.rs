use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::{IpFilterAction, IpFilterEngine, ResolveMode};
use crate::menu::{Menu, MenuItem, Selection};
use crate::models::filter::{FilterName, IpFilterRules};

/// IP filter engine backed by a directory of saved rule sets.
///
/// Each file in the directory is one rule set, named by its file name and
/// handed over as an opaque payload.
pub struct FileFilterEngine<M: Menu> {
    dir: PathBuf,
    menu: M,
}

impl<M: Menu> FileFilterEngine<M> {
    pub fn new(dir: impl Into<PathBuf>, menu: M) -> Self {
        Self {
            dir: dir.into(),
            menu,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Names of the saved rule sets, sorted
    pub fn list_filters(&self) -> Result<Vec<FilterName>> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Unable to list IP filters in {}", self.dir.display()))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            match entry.file_name().to_str().map(FilterName::new) {
                Some(Ok(name)) => names.push(name),
                _ => debug!("Skipping {:?}: not a usable filter name", entry.file_name()),
            }
        }
        names.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(names)
    }

    fn filter_path(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name.contains('/') || name.contains('\\') || name == "." || name == ".." {
            bail!("Invalid IP filter name '{}'", name);
        }
        Ok(self.dir.join(name))
    }
}

impl<M: Menu> IpFilterEngine for FileFilterEngine<M> {
    fn define_interactively(&mut self) -> Result<IpFilterAction> {
        let names = self.list_filters()?;
        if names.is_empty() {
            bail!("No IP filters defined in {}", self.dir.display());
        }

        let mut items: Vec<MenuItem> = names
            .iter()
            .map(|name| MenuItem::Entry {
                label: name.to_string(),
                description: "Applies this IP filter".to_string(),
                hotkey: None,
            })
            .collect();
        items.push(MenuItem::Separator);
        items.push(MenuItem::entry("Detach filter", "Removes the applied IP filter", 'd'));
        items.push(MenuItem::entry("Exit menu", "Returns without changes", 'x'));

        self.menu.show(&items)?;
        let row = match self.menu.selection()? {
            Selection::Row(row) => row,
            Selection::Aborted => return Ok(IpFilterAction::Aborted),
        };

        let detach_row = names.len() + 2;
        if row == detach_row {
            return Ok(IpFilterAction::Detach);
        }
        let name = match row.checked_sub(1).and_then(|i| names.get(i)) {
            Some(name) => name.clone(),
            None => return Ok(IpFilterAction::Aborted),
        };

        let rules = self.load_by_name(name.as_str(), ResolveMode::DontResolve)?;
        info!("Selected IP filter '{}'", name);
        Ok(IpFilterAction::Apply { name, rules })
    }

    fn load_by_name(&mut self, name: &str, mode: ResolveMode) -> Result<IpFilterRules> {
        let path = self.filter_path(name)?;
        debug!("Loading IP filter '{}' from {} ({:?})", name, path.display(), mode);

        let payload = fs::read(&path)
            .with_context(|| format!("Unable to read IP filter {}", path.display()))?;
        IpFilterRules::new(payload).map_err(|e| anyhow!("IP filter '{}': {}", name, e))
    }
}
