//! Free-text filtering of records.

use serde::Deserialize;
use serde::Serialize;

use crate::model::CollectionSchema;
use crate::model::Record;

/// Which field values a filter term is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    /// The schema's searchable fields only.
    #[default]
    Declared,
    /// Every field of the record, the identifier included.
    AllFields,
}

/// A case-insensitive substring search term.
///
/// The empty term matches every record.
///
/// # Example
///
/// ```
/// use backoffice_lib::query::FilterTerm;
///
/// let term = FilterTerm::new("IVO");
/// assert!(term.matches_text("Ivory"));
/// assert!(!term.matches_text("Cream"));
/// assert!(FilterTerm::default().matches_text("anything"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterTerm {
    raw: String,
    needle: String,
}

impl FilterTerm {
    /// Creates a term from user input.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let needle = raw.to_lowercase();
        Self { raw, needle }
    }

    /// The term as typed.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns `true` if the term matches everything.
    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    /// Tests one display string.
    pub fn matches_text(&self, text: &str) -> bool {
        self.is_empty() || text.to_lowercase().contains(&self.needle)
    }

    /// Tests a record under the given scope.
    pub fn matches(&self, record: &Record, schema: &CollectionSchema, scope: SearchScope) -> bool {
        if self.is_empty() {
            return true;
        }
        match scope {
            SearchScope::Declared => schema
                .searchable_fields()
                .any(|spec| self.matches_text(&record.display(&spec.name))),
            SearchScope::AllFields => {
                record.id().is_some_and(|id| self.matches_text(&id.to_string()))
                    || record
                        .fields()
                        .values()
                        .any(|value| self.matches_text(&value.display()))
            }
        }
    }
}

impl From<&str> for FilterTerm {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Lazily yields the records matching `term`, in input order.
pub fn derive_filtered<'a>(
    records: &'a [Record],
    schema: &'a CollectionSchema,
    term: &'a FilterTerm,
    scope: SearchScope,
) -> impl Iterator<Item = &'a Record> + 'a {
    records
        .iter()
        .filter(move |record| term.matches(record, schema, scope))
}
