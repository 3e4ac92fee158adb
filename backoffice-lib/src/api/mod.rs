//! REST API operations

mod collection;
mod content;
mod execute;

pub use collection::*;
