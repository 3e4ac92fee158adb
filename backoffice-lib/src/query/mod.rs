//! Client-side search and ordering of collection records.
//!
//! # Shared Types
//!
//! - [`FilterTerm`] - case-insensitive substring search
//! - [`SortDirective`] - the single active `(field, direction)` ordering
//!
//! # Derivations
//!
//! - [`derive_filtered`] - lazy subsequence of matching records
//! - [`derive_sorted`] - fresh ordered copy, input left untouched

mod filter;
mod order;
mod sort;

pub use filter::FilterTerm;
pub use filter::SearchScope;
pub use filter::derive_filtered;
pub use order::Direction;
pub use order::SortDirective;
pub use sort::compare_field;
pub use sort::derive_sorted;
