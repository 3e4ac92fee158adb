//! Typed models

pub mod catalog;
mod content;
mod record;
mod record_serde;
mod schema;
mod value;

pub use content::*;
pub use record::*;
pub use schema::*;
pub use value::Value;
