//! Declared field lists for managed collections.
//!
//! Every managed collection states up front which fields exist, how they
//! compare, which ones free-text search looks at and which ones a submitted
//! form must fill in. Sorting and filtering dispatch on [`FieldKind`] instead
//! of guessing from whatever the backend sent.

use rust_decimal::prelude::ToPrimitive;

use super::ID_FIELD;
use super::Record;
use super::Value;
use super::value::parse_datetime;
use super::value::parse_decimal;
use crate::error::FieldError;
use crate::error::FieldValidationError;
use crate::error::ValidationErrors;
use crate::query::Direction;
use crate::query::SearchScope;
use crate::query::SortDirective;

/// How a field's values compare and parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Free text, compared case-insensitively.
    Text,
    /// Numbers, compared by numeric difference.
    Numeric,
    /// Timestamps, compared chronologically.
    Date,
}

impl FieldKind {
    /// Parses raw form input into a value of this kind.
    ///
    /// Input that does not parse is kept as a string so validation can
    /// report it instead of silently dropping it.
    pub fn parse_input(self, raw: &str) -> Value {
        let trimmed = raw.trim();
        match self {
            FieldKind::Text => Value::String(raw.to_string()),
            FieldKind::Numeric => match parse_decimal(trimmed) {
                Some(d) if d.scale() == 0 => d.to_i64().map_or(Value::Decimal(d), Value::Int),
                Some(d) => Value::Decimal(d),
                None if trimmed.is_empty() => Value::Null,
                None => Value::String(raw.to_string()),
            },
            FieldKind::Date => match parse_datetime(trimmed) {
                Some(dt) => Value::DateTime(dt),
                None if trimmed.is_empty() => Value::Null,
                None => Value::String(raw.to_string()),
            },
        }
    }
}

/// One declared field of a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Field name as it appears in backend payloads.
    pub name: String,
    /// Comparison and parsing kind.
    pub kind: FieldKind,
    /// Whether free-text search looks at this field.
    pub searchable: bool,
    /// Whether a submitted form must fill this field.
    pub required: bool,
    /// Whether the field is shown as a table column.
    pub displayed: bool,
    /// Whether the field may be edited (server-computed fields are not).
    pub editable: bool,
}

impl FieldSpec {
    fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            searchable: false,
            required: false,
            displayed: true,
            editable: true,
        }
    }

    /// A searchable text field.
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            searchable: true,
            ..Self::new(name, FieldKind::Text)
        }
    }

    /// A numeric field.
    pub fn numeric(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Numeric)
    }

    /// A server-maintained timestamp.
    pub fn date(name: impl Into<String>) -> Self {
        Self {
            editable: false,
            ..Self::new(name, FieldKind::Date)
        }
    }

    /// Marks the field as required on submit.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets whether free-text search looks at the field.
    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    /// Hides the field from table columns.
    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    /// Marks the field as maintained by the backend.
    pub fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }
}

/// What to do with local state after a successful update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePolicy {
    /// Refetch the whole collection; server-computed fields stay exact.
    Refetch,
    /// Patch the single record in place; no extra round trip.
    PatchLocal,
}

/// Static description of one managed collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSchema {
    /// Human-readable name used in notices.
    pub label: String,
    /// Path segment of the REST resource (e.g. `prices`).
    pub path: String,
    /// Path segment for single-record routes when it differs from `path`
    /// (features are listed at `/features` but updated at `/feature/{id}`).
    pub item_path: Option<String>,
    /// Payload key holding the identifier.
    pub id_field: String,
    /// The backend only lists and creates; there is no update or delete route.
    pub read_create_only: bool,
    /// Declared fields, in column order.
    pub fields: Vec<FieldSpec>,
    /// Sort applied before the user picks one.
    pub default_sort: SortDirective,
    /// Reconciliation policy after update.
    pub update_policy: UpdatePolicy,
    /// Default free-text search scope.
    pub search_scope: SearchScope,
}

impl CollectionSchema {
    /// Creates a schema with no fields, sorted by `id` descending.
    pub fn new(label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            path: path.into(),
            item_path: None,
            id_field: ID_FIELD.to_string(),
            read_create_only: false,
            fields: Vec::new(),
            default_sort: SortDirective::new(ID_FIELD, Direction::Descending),
            update_policy: UpdatePolicy::Refetch,
            search_scope: SearchScope::Declared,
        }
    }

    /// Adds a field (builder pattern).
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Sets the default sort.
    pub fn sort_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.default_sort = SortDirective::new(field, direction);
        self
    }

    /// Sets the update policy.
    pub fn update_policy(mut self, policy: UpdatePolicy) -> Self {
        self.update_policy = policy;
        self
    }

    /// Sets the default search scope.
    pub fn search_scope(mut self, scope: SearchScope) -> Self {
        self.search_scope = scope;
        self
    }

    /// Routes single-record calls through a different path segment.
    pub fn item_path(mut self, path: impl Into<String>) -> Self {
        self.item_path = Some(path.into());
        self
    }

    /// Reads the identifier from another payload key.
    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Declares that records can only be listed and created.
    pub fn read_create_only(mut self) -> Self {
        self.read_create_only = true;
        self
    }

    /// Path segment used for `PUT`/`DELETE /{segment}/{id}`.
    pub fn record_path(&self) -> &str {
        self.item_path.as_deref().unwrap_or(&self.path)
    }

    /// Whether existing records may be updated or deleted.
    pub fn allows_changes(&self) -> bool {
        !self.read_create_only
    }

    /// Returns the spec of a declared field.
    pub fn spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the kind of a field; the identifier is always numeric.
    pub fn kind_of(&self, name: &str) -> Option<FieldKind> {
        if name == ID_FIELD {
            return Some(FieldKind::Numeric);
        }
        self.spec(name).map(|f| f.kind)
    }

    /// Like [`kind_of`](Self::kind_of) but fails on undeclared fields.
    pub fn require_kind(&self, name: &str) -> Result<FieldKind, FieldError> {
        self.kind_of(name)
            .ok_or_else(|| FieldError::undeclared(name, &self.path))
    }

    /// Fields free-text search looks at.
    pub fn searchable_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.searchable)
    }

    /// Fields shown as table columns.
    pub fn displayed_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.displayed)
    }

    /// Builds a payload from raw `(field, text)` form input.
    ///
    /// Each value is parsed according to its declared kind. Undeclared
    /// fields are rejected.
    pub fn payload_from_input<'a>(
        &self,
        input: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Record, FieldError> {
        let mut record = Record::new();
        for (name, raw) in input {
            let spec = self
                .spec(name)
                .ok_or_else(|| FieldError::undeclared(name, &self.path))?;
            record.insert(name, spec.kind.parse_input(raw));
        }
        Ok(record)
    }

    /// Checks a payload before it is submitted.
    ///
    /// Required fields must be present and non-blank; numeric fields that
    /// are filled in must hold a number.
    pub fn validate(&self, payload: &Record) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        for spec in &self.fields {
            let value = payload.get(&spec.name);
            let blank = value.is_none_or(Value::is_blank);
            if blank {
                if spec.required {
                    errors.push(FieldValidationError::required(&spec.name));
                }
                continue;
            }
            if spec.kind == FieldKind::Numeric
                && let Some(value) = value
                && value.as_decimal().is_none()
            {
                errors.push(FieldValidationError::not_numeric(&spec.name, &value.display()));
            }
        }
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn colors() -> CollectionSchema {
        CollectionSchema::new("Paper colors", "paper_colors")
            .field(FieldSpec::text("color_name").required())
            .field(FieldSpec::text("color_code").required())
            .field(FieldSpec::numeric("color_price").required())
    }

    #[test]
    fn test_validate_reports_each_missing_field() {
        let payload = Record::new().set("color_name", "  ").set("color_price", 0i64);
        let errors = colors().validate(&payload).unwrap_err();

        assert!(errors.for_field("color_name").is_some());
        assert!(errors.for_field("color_code").is_some());
        assert!(errors.for_field("color_price").is_none());
    }

    #[test]
    fn test_validate_rejects_non_numeric_price() {
        let payload = Record::new()
            .set("color_name", "Ivory")
            .set("color_code", "#fffff0")
            .set("color_price", "cheap");
        let errors = colors().validate(&payload).unwrap_err();

        assert_eq!(errors.errors().len(), 1);
        assert_eq!(errors.errors()[0].field, "color_price");
    }

    #[test]
    fn test_payload_from_input_parses_by_kind() {
        let payload = colors()
            .payload_from_input([("color_name", "Ivory"), ("color_price", "12.50")])
            .unwrap();

        assert_eq!(payload.get_string("color_name").unwrap(), Some("Ivory"));
        assert_eq!(payload.get_decimal("color_price").unwrap(), Some(Decimal::new(1250, 2)));
    }

    #[test]
    fn test_payload_from_input_rejects_undeclared() {
        let err = colors().payload_from_input([("colour", "red")]).unwrap_err();
        assert!(matches!(err, FieldError::Undeclared { .. }));
    }

    #[test]
    fn test_record_path_falls_back_to_path() {
        assert_eq!(colors().record_path(), "paper_colors");
        assert!(colors().allows_changes());

        let features = CollectionSchema::new("Features", "features").item_path("feature");
        assert_eq!(features.record_path(), "feature");
        assert_eq!(features.path, "features");

        let smells = CollectionSchema::new("Envelope smells", "envelope_smell").read_create_only();
        assert!(!smells.allows_changes());
    }

    #[test]
    fn test_id_is_numeric() {
        assert_eq!(colors().kind_of("id"), Some(FieldKind::Numeric));
        assert_eq!(colors().kind_of("nope"), None);
    }
}
