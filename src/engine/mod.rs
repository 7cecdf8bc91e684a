//! Seam to the IP filter engine.
//!
//! The engine owns the IP filter rule language. This crate only asks it for
//! a rule set, either interactively or by name, and stores what it returns.

pub mod file;

use crate::models::filter::{FilterName, IpFilterRules};

/// How host names inside a rule set are handled when it is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Resolve names to addresses while loading
    Resolve,
    /// Keep rules as written
    DontResolve,
}

/// Outcome of an interactive IP filter definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpFilterAction {
    /// Apply the named rule set
    Apply { name: FilterName, rules: IpFilterRules },
    /// Remove the applied filter
    Detach,
    /// The operator backed out without choosing
    Aborted,
}

/// External IP filter engine
pub trait IpFilterEngine {
    /// Let the operator pick or define a filter
    fn define_interactively(&mut self) -> anyhow::Result<IpFilterAction>;

    /// Load a previously saved rule set by name
    fn load_by_name(&mut self, name: &str, mode: ResolveMode) -> anyhow::Result<IpFilterRules>;
}
