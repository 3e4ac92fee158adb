//! Dynamic collection record

use std::collections::HashMap;

use chrono::DateTime;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::Serialize;

use super::Value;
use crate::error::FieldError;

/// Name of the identifier field in backend payloads.
pub const ID_FIELD: &str = "id";

/// Backend-assigned record identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RecordId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(RecordId)
    }
}

impl From<i64> for RecordId {
    fn from(v: i64) -> Self {
        RecordId(v)
    }
}

/// A dynamic record from a back-office collection.
///
/// Records hold field values as a `HashMap<String, Value>`. The identifier is
/// kept apart from the fields: it is assigned by the backend and never sent
/// back in a create or update payload.
///
/// # Example
///
/// ```
/// use backoffice_lib::model::Record;
///
/// let record = Record::new()
///     .set("color_name", "Ivory")
///     .set("color_code", "#fffff0");
///
/// assert_eq!(record.get_string("color_name").unwrap(), Some("Ivory"));
/// assert!(record.id().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    /// The identifier, absent on payloads that were never persisted.
    pub(crate) id: Option<RecordId>,

    /// The field values.
    pub(crate) fields: HashMap<String, Value>,
}

impl Record {
    /// Creates a new empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new record with the given ID.
    pub fn with_id(id: impl Into<RecordId>) -> Self {
        Self {
            id: Some(id.into()),
            fields: HashMap::new(),
        }
    }

    /// Returns the record ID, if set.
    pub fn id(&self) -> Option<RecordId> {
        self.id
    }

    /// Sets the record ID.
    pub fn set_id(&mut self, id: impl Into<RecordId>) {
        self.id = Some(id.into());
    }

    /// Moves an integer field into the identifier slot.
    ///
    /// Some collections key their rows on a field other than `id` (cities use
    /// `city_id`). Returns `false` and leaves the record untouched when the
    /// field is absent or not an integer.
    pub fn adopt_id(&mut self, field: &str) -> bool {
        let id = match self.fields.get(field) {
            Some(Value::Int(n)) => RecordId(*n),
            Some(Value::String(s)) => match s.parse() {
                Ok(id) => id,
                Err(_) => return false,
            },
            _ => return false,
        };
        self.fields.remove(field);
        self.id = Some(id);
        true
    }

    // =========================================================================
    // Raw field access
    // =========================================================================

    /// Returns a reference to the field value, if it exists.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns `true` if the record contains the given field.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns a reference to all fields.
    pub fn fields(&self) -> &HashMap<String, Value> {
        &self.fields
    }

    /// Returns the display string of a field; the identifier is addressable as `id`.
    pub fn display(&self, field: &str) -> String {
        if field == ID_FIELD {
            return self.id.map(|id| id.to_string()).unwrap_or_default();
        }
        self.fields.get(field).map(Value::display).unwrap_or_default()
    }

    /// Returns the field as a value, treating `id` as an integer field.
    pub fn value_of(&self, field: &str) -> Option<Value> {
        if field == ID_FIELD {
            return self.id.map(|id| Value::Int(id.0));
        }
        self.fields.get(field).cloned()
    }

    // =========================================================================
    // Setters
    // =========================================================================

    /// Sets a field value (builder pattern).
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    /// Inserts a field value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Removes a field and returns its value.
    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.fields.remove(field)
    }

    /// Returns a copy with one field replaced and the identifier preserved.
    pub fn with_field(&self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut copy = self.clone();
        copy.fields.insert(field.into(), value.into());
        copy
    }

    /// Overlays every field of `patch` onto this record, keeping the identifier.
    pub fn merge(&mut self, patch: &Record) {
        for (key, value) in &patch.fields {
            self.fields.insert(key.clone(), value.clone());
        }
    }

    // =========================================================================
    // Typed getters
    //
    // Return Err if field is missing or wrong type.
    // Return Ok(None) only if the field exists and is Value::Null.
    // =========================================================================

    /// Gets a string field value.
    pub fn get_string(&self, field: &str) -> Result<Option<&str>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(FieldError::type_mismatch(
                field,
                "string",
                other.type_name(),
            )),
        }
    }

    /// Gets an integer field value.
    pub fn get_int(&self, field: &str) -> Result<Option<i64>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Int(n)) => Ok(Some(*n)),
            Some(other) => Err(FieldError::type_mismatch(field, "int", other.type_name())),
        }
    }

    /// Gets a numeric field value; integers widen to decimal.
    pub fn get_decimal(&self, field: &str) -> Result<Option<Decimal>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Decimal(d)) => Ok(Some(*d)),
            Some(Value::Int(n)) => Ok(Some(Decimal::from(*n))),
            Some(other) => Err(FieldError::type_mismatch(
                field,
                "decimal",
                other.type_name(),
            )),
        }
    }

    /// Gets a DateTime field value.
    pub fn get_datetime(&self, field: &str) -> Result<Option<DateTime<Utc>>, FieldError> {
        match self.fields.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::DateTime(dt)) => Ok(Some(*dt)),
            Some(other) => Err(FieldError::type_mismatch(
                field,
                "datetime",
                other.type_name(),
            )),
        }
    }
}
