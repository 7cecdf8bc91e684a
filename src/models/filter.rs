use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::engine::{IpFilterAction, IpFilterEngine};
use crate::utils::error::{FilterError, FilterResult};

/// Capacity of the persisted IP filter name buffer, in bytes
pub const NAME_CAPACITY: usize = 64;

/// Capacity of the persisted IP filter rule payload, in bytes
pub const RULES_CAPACITY: usize = 4096;

/// Name of an IP filter rule set, bounded by the snapshot name buffer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilterName(String);

impl FilterName {
    pub fn new(name: impl Into<String>) -> FilterResult<Self> {
        let name = name.into();
        if name.is_empty() || name.contains('\0') {
            return Err(FilterError::InvalidFilterName(name));
        }
        if name.len() > NAME_CAPACITY {
            return Err(FilterError::NameTooLong {
                len: name.len(),
                limit: NAME_CAPACITY,
            });
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FilterName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compiled IP filter rules, owned by the IP filter engine.
///
/// The payload is opaque here. Clones share the same buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpFilterRules(Arc<[u8]>);

impl IpFilterRules {
    /// Wrap an engine payload; payloads larger than [`RULES_CAPACITY`] are
    /// rejected instead of truncated.
    pub fn new(payload: impl Into<Vec<u8>>) -> FilterResult<Self> {
        let payload = payload.into();
        if payload.len() > RULES_CAPACITY {
            return Err(FilterError::RulesTooLarge {
                size: payload.len(),
                limit: RULES_CAPACITY,
            });
        }
        Ok(Self(payload.into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An applied IP filter: its name and the rules the engine produced for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpFilter {
    pub name: FilterName,
    pub rules: IpFilterRules,
}

/// Display state for non-IP traffic plus the applied IP filter
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    /// Show ARP packets
    pub arp: bool,

    /// Show RARP packets
    pub rarp: bool,

    /// Show every other non-IP packet
    pub non_ip: bool,

    /// Applied IP filter, if any
    ip_filter: Option<IpFilter>,
}

impl FilterState {
    /// All toggles off, no IP filter
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_arp(&mut self) {
        self.arp = !self.arp;
    }

    pub fn toggle_rarp(&mut self) {
        self.rarp = !self.rarp;
    }

    pub fn toggle_non_ip(&mut self) {
        self.non_ip = !self.non_ip;
    }

    pub fn ip_filter(&self) -> Option<&IpFilter> {
        self.ip_filter.as_ref()
    }

    pub fn ip_filter_name(&self) -> Option<&FilterName> {
        self.ip_filter.as_ref().map(|f| &f.name)
    }

    pub fn ip_filter_active(&self) -> bool {
        self.ip_filter.is_some()
    }

    /// Run the engine's interactive definition and store the result.
    ///
    /// Returns `true` only when a filter was applied. A detach request
    /// clears the current filter; an abort leaves the state untouched.
    pub fn apply_ip_filter<E>(&mut self, engine: &mut E) -> anyhow::Result<bool>
    where
        E: IpFilterEngine + ?Sized,
    {
        match engine.define_interactively()? {
            IpFilterAction::Apply { name, rules } => {
                info!("Applying IP filter '{}' ({} bytes of rules)", name, rules.len());
                self.ip_filter = Some(IpFilter { name, rules });
                Ok(true)
            }
            IpFilterAction::Detach => {
                self.clear_ip_filter();
                Ok(false)
            }
            IpFilterAction::Aborted => Ok(false),
        }
    }

    /// Remove the applied IP filter, if any
    pub fn clear_ip_filter(&mut self) {
        if let Some(filter) = self.ip_filter.take() {
            info!("Detached IP filter '{}'", filter.name);
        }
    }

    /// Replace the rules of the applied filter after a reload.
    ///
    /// Ignored when no filter is applied.
    pub(crate) fn replace_ip_filter_rules(&mut self, rules: IpFilterRules) {
        match self.ip_filter.as_mut() {
            Some(filter) => filter.rules = rules,
            None => warn!("Discarding reloaded IP filter rules: no filter applied"),
        }
    }

    pub(crate) fn set_ip_filter(&mut self, filter: Option<IpFilter>) {
        self.ip_filter = filter;
    }

    /// Serializable summary of this state
    pub fn status(&self) -> FilterStatus {
        FilterStatus {
            arp: self.arp,
            rarp: self.rarp,
            non_ip: self.non_ip,
            ip_filter_active: self.ip_filter_active(),
            ip_filter: self.ip_filter_name().map(|n| n.to_string()),
        }
    }
}

/// Summary of a filter state for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterStatus {
    /// ARP packets visible
    pub arp: bool,

    /// RARP packets visible
    pub rarp: bool,

    /// Other non-IP packets visible
    pub non_ip: bool,

    /// Whether an IP filter is applied
    pub ip_filter_active: bool,

    /// Name of the applied IP filter
    pub ip_filter: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ResolveMode;

    struct ScriptedEngine {
        action: Option<IpFilterAction>,
    }

    impl IpFilterEngine for ScriptedEngine {
        fn define_interactively(&mut self) -> anyhow::Result<IpFilterAction> {
            self.action
                .take()
                .ok_or_else(|| anyhow::anyhow!("no scripted action"))
        }

        fn load_by_name(&mut self, _name: &str, _mode: ResolveMode) -> anyhow::Result<IpFilterRules> {
            unreachable!("not used by these tests")
        }
    }

    fn web_only() -> IpFilterAction {
        IpFilterAction::Apply {
            name: FilterName::new("web-only").unwrap(),
            rules: IpFilterRules::new(b"tcp 80 443".to_vec()).unwrap(),
        }
    }

    #[test]
    fn test_default_state_is_all_off() {
        let state = FilterState::new();
        assert!(!state.arp && !state.rarp && !state.non_ip);
        assert!(!state.ip_filter_active());
        assert!(state.ip_filter_name().is_none());
    }

    #[test]
    fn test_toggles_are_involutions() {
        let mut state = FilterState::new();
        state.toggle_arp();
        assert!(state.arp);
        state.toggle_arp();
        assert!(!state.arp);

        state.rarp = true;
        state.toggle_rarp();
        state.toggle_rarp();
        assert!(state.rarp);

        state.toggle_non_ip();
        state.toggle_non_ip();
        assert!(!state.non_ip);
    }

    #[test]
    fn test_toggles_are_independent() {
        let mut state = FilterState::new();
        state.toggle_rarp();
        assert!(!state.arp);
        assert!(state.rarp);
        assert!(!state.non_ip);
    }

    #[test]
    fn test_apply_ip_filter_sets_active() {
        let mut state = FilterState::new();
        let mut engine = ScriptedEngine { action: Some(web_only()) };
        assert!(state.apply_ip_filter(&mut engine).unwrap());
        assert!(state.ip_filter_active());
        assert_eq!(state.ip_filter_name().unwrap().as_str(), "web-only");
        assert_eq!(state.ip_filter().unwrap().rules.as_bytes(), b"tcp 80 443");
    }

    #[test]
    fn test_aborted_definition_leaves_state_unchanged() {
        let mut state = FilterState::new();
        let mut engine = ScriptedEngine { action: Some(web_only()) };
        state.apply_ip_filter(&mut engine).unwrap();
        let before = state.clone();

        let mut engine = ScriptedEngine { action: Some(IpFilterAction::Aborted) };
        assert!(!state.apply_ip_filter(&mut engine).unwrap());
        assert_eq!(state, before);
    }

    #[test]
    fn test_detach_clears_filter() {
        let mut state = FilterState::new();
        let mut engine = ScriptedEngine { action: Some(web_only()) };
        state.apply_ip_filter(&mut engine).unwrap();

        let mut engine = ScriptedEngine { action: Some(IpFilterAction::Detach) };
        assert!(!state.apply_ip_filter(&mut engine).unwrap());
        assert!(!state.ip_filter_active());
    }

    #[test]
    fn test_engine_failure_is_propagated_without_mutation() {
        let mut state = FilterState::new();
        let mut engine = ScriptedEngine { action: None };
        assert!(state.apply_ip_filter(&mut engine).is_err());
        assert_eq!(state, FilterState::new());
    }

    #[test]
    fn test_filter_name_limits() {
        assert!(FilterName::new("x".repeat(NAME_CAPACITY)).is_ok());
        assert!(matches!(
            FilterName::new("x".repeat(NAME_CAPACITY + 1)),
            Err(FilterError::NameTooLong { .. })
        ));
        assert!(matches!(FilterName::new(""), Err(FilterError::InvalidFilterName(_))));
        assert!(matches!(FilterName::new("a\0b"), Err(FilterError::InvalidFilterName(_))));
    }

    #[test]
    fn test_oversized_rules_are_rejected() {
        assert!(IpFilterRules::new(vec![0u8; RULES_CAPACITY]).is_ok());
        match IpFilterRules::new(vec![0u8; RULES_CAPACITY + 1]) {
            Err(FilterError::RulesTooLarge { size, limit }) => {
                assert_eq!(size, RULES_CAPACITY + 1);
                assert_eq!(limit, RULES_CAPACITY);
            }
            other => panic!("expected RulesTooLarge, got {:?}", other),
        }
    }

    #[test]
    fn test_status_serializes_to_json() {
        let mut state = FilterState::new();
        state.toggle_arp();
        let json = serde_json::to_value(state.status()).unwrap();
        assert_eq!(json["arp"], true);
        assert_eq!(json["rarp"], false);
        assert_eq!(json["ip_filter_active"], false);
        assert!(json["ip_filter"].is_null());
    }
}
