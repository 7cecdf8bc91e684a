//! Interactive filter configuration.
//!
//! Drawing is left to implementors of [`Menu`] and [`StatusDisplay`]; the
//! controller only hands them semantic rows and labels.

pub mod controller;
pub mod terminal;

use std::io;

use crate::models::filter::FilterState;

/// One row of a menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    /// Selectable row
    Entry {
        /// Text shown on the row
        label: String,
        /// Help text shown while the row is highlighted
        description: String,
        /// Key that selects the row directly
        hotkey: Option<char>,
    },
    /// Non-selectable divider
    Separator,
}

impl MenuItem {
    pub fn entry(label: &str, description: &str, hotkey: char) -> Self {
        MenuItem::Entry {
            label: label.to_string(),
            description: description.to_string(),
            hotkey: Some(hotkey),
        }
    }

    pub fn is_selectable(&self) -> bool {
        matches!(self, MenuItem::Entry { .. })
    }
}

/// Result of waiting on a menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// 1-based row index
    Row(usize),
    /// The operator cancelled
    Aborted,
}

/// Menu presentation collaborator
pub trait Menu {
    /// Present the rows
    fn show(&mut self, items: &[MenuItem]) -> io::Result<()>;

    /// Block until the operator picks a row or aborts
    fn selection(&mut self) -> io::Result<Selection>;
}

/// Rows of the filter status panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusRow {
    IpFilter,
    Arp,
    Rarp,
    NonIp,
}

impl StatusRow {
    pub const ALL: [StatusRow; 4] = [
        StatusRow::IpFilter,
        StatusRow::Arp,
        StatusRow::Rarp,
        StatusRow::NonIp,
    ];

    /// 1-based line within the status panel
    pub fn line(self) -> u16 {
        match self {
            StatusRow::IpFilter => 1,
            StatusRow::Arp => 2,
            StatusRow::Rarp => 3,
            StatusRow::NonIp => 4,
        }
    }

    /// Label describing `state` for this row
    pub fn label(self, state: &FilterState) -> &'static str {
        match self {
            StatusRow::IpFilter if state.ip_filter_active() => "IP filter active",
            StatusRow::IpFilter => "No IP filter active",
            StatusRow::Arp if state.arp => "ARP visible",
            StatusRow::Arp => "ARP not visible",
            StatusRow::Rarp if state.rarp => "RARP visible",
            StatusRow::Rarp => "RARP not visible",
            StatusRow::NonIp if state.non_ip => "Non-IP visible",
            StatusRow::NonIp => "Non-IP not visible",
        }
    }
}

/// Status panel presentation collaborator
pub trait StatusDisplay {
    /// Draw `text` on the given status row
    fn render_status(&mut self, row: StatusRow, text: &str) -> io::Result<()>;

    /// Show a message the operator must acknowledge
    fn notify(&mut self, message: &str) -> io::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels_follow_state() {
        let mut state = FilterState::new();
        assert_eq!(StatusRow::IpFilter.label(&state), "No IP filter active");
        assert_eq!(StatusRow::Arp.label(&state), "ARP not visible");
        assert_eq!(StatusRow::Rarp.label(&state), "RARP not visible");
        assert_eq!(StatusRow::NonIp.label(&state), "Non-IP not visible");

        state.toggle_arp();
        state.toggle_rarp();
        state.toggle_non_ip();
        assert_eq!(StatusRow::Arp.label(&state), "ARP visible");
        assert_eq!(StatusRow::Rarp.label(&state), "RARP visible");
        assert_eq!(StatusRow::NonIp.label(&state), "Non-IP visible");
    }

    #[test]
    fn test_separator_is_not_selectable() {
        assert!(!MenuItem::Separator.is_selectable());
        assert!(MenuItem::entry("ARP", "Toggles ARP", 'a').is_selectable());
    }
}
