//! Tabular collection manager

mod collection;
mod state;

pub use collection::*;
pub use state::*;
