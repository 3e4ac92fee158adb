//! Sort directive for table columns.

use serde::Deserialize;
use serde::Serialize;

/// Sort direction for ordering results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Ascending order (A-Z, 0-9).
    Ascending,
    /// Descending order (Z-A, 9-0).
    Descending,
}

impl Direction {
    /// Returns the opposite direction.
    pub fn flipped(self) -> Self {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }
}

/// The single active ordering of a table.
///
/// # Example
///
/// ```
/// use backoffice_lib::query::{Direction, SortDirective};
///
/// let sort = SortDirective::asc("price_name");
/// let sort = sort.toggled("price_name");
/// assert_eq!(sort.direction, Direction::Descending);
///
/// let sort = sort.toggled("price_value");
/// assert_eq!(sort, SortDirective::asc("price_value"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortDirective {
    /// Field the table is ordered by.
    pub field: String,
    /// Order direction.
    pub direction: Direction,
}

impl SortDirective {
    /// Creates a directive.
    pub fn new(field: impl Into<String>, direction: Direction) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    /// Creates an ascending order on a field.
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, Direction::Ascending)
    }

    /// Creates a descending order on a field.
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, Direction::Descending)
    }

    /// Returns the directive after the user picks `field`.
    ///
    /// Picking the active field flips the direction; picking another field
    /// starts over at ascending.
    pub fn toggled(&self, field: &str) -> Self {
        if self.field == field {
            Self::new(field, self.direction.flipped())
        } else {
            Self::asc(field)
        }
    }
}
