//! Non-IP packet filter configuration for a traffic monitor.
//!
//! Holds the ARP/RARP/non-IP display toggles and the applied IP filter,
//! decides visibility of non-IP packets, persists the configuration across
//! restarts, and drives the interactive menu that edits it.

pub mod capture;
pub mod engine;
pub mod menu;
pub mod models;
pub mod store;
pub mod utils;

pub use capture::classifier::{classify, classify_frame, NonIpProtocol};
pub use models::filter::{FilterName, FilterState, FilterStatus, IpFilter, IpFilterRules};
pub use store::persistence::{FilterStore, LoadedState};
pub use utils::error::{FilterError, FilterResult};
