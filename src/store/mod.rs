//! Persistence of the filter state.

pub mod facility;
pub mod persistence;
pub mod snapshot;
