//! Field comparators and sorted views.

use std::cmp::Ordering;

use unicase::UniCase;

use super::Direction;
use super::SortDirective;
use crate::error::FieldError;
use crate::model::CollectionSchema;
use crate::model::FieldKind;
use crate::model::Record;

/// Compares two records on one field in ascending order.
///
/// - `Numeric`: numeric difference; numeric strings are read as numbers
/// - `Date`: chronological
/// - `Text`: Unicode case-insensitive
///
/// A record lacking a comparable value orders before one that has it.
pub fn compare_field(a: &Record, b: &Record, field: &str, kind: FieldKind) -> Ordering {
    match kind {
        FieldKind::Numeric => {
            let a = a.value_of(field).and_then(|v| v.as_decimal());
            let b = b.value_of(field).and_then(|v| v.as_decimal());
            a.cmp(&b)
        }
        FieldKind::Date => {
            let a = a.value_of(field).and_then(|v| v.as_datetime());
            let b = b.value_of(field).and_then(|v| v.as_datetime());
            a.cmp(&b)
        }
        FieldKind::Text => {
            let a = a.display(field);
            let b = b.display(field);
            UniCase::new(a.as_str()).cmp(&UniCase::new(b.as_str()))
        }
    }
}

/// Returns a freshly ordered copy of `records` under `directive`.
///
/// The sort is stable: records that compare equal keep their input order.
/// Fails if the directive names a field the schema does not declare.
pub fn derive_sorted<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    schema: &CollectionSchema,
    directive: &SortDirective,
) -> Result<Vec<&'a Record>, FieldError> {
    let kind = schema.require_kind(&directive.field)?;
    let mut sorted: Vec<&Record> = records.into_iter().collect();
    sorted.sort_by(|a, b| {
        let ordering = compare_field(a, b, &directive.field, kind);
        match directive.direction {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    });
    Ok(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FieldSpec;
    use crate::model::RecordId;
    use crate::model::Value;

    fn schema() -> CollectionSchema {
        CollectionSchema::new("Prices", "prices")
            .field(FieldSpec::text("name"))
            .field(FieldSpec::numeric("price"))
            .field(FieldSpec::date("created_at"))
    }

    fn ids(records: &[&Record]) -> Vec<i64> {
        records.iter().filter_map(|r| r.id()).map(|id| id.0).collect()
    }

    #[test]
    fn test_sort_by_price_ascending() {
        let records = vec![
            Record::with_id(RecordId(1)).set("name", "A").set("price", 10i64),
            Record::with_id(RecordId(2)).set("name", "B").set("price", 5i64),
        ];
        let sorted = derive_sorted(&records, &schema(), &SortDirective::asc("price")).unwrap();
        assert_eq!(ids(&sorted), vec![2, 1]);
        // Source untouched.
        assert_eq!(records[0].id().map(|id| id.0), Some(1));
    }

    #[test]
    fn test_numeric_is_not_lexicographic() {
        let records = vec![
            Record::with_id(RecordId(1)).set("price", "9"),
            Record::with_id(RecordId(2)).set("price", "10"),
            Record::with_id(RecordId(3)).set("price", 2i64),
        ];
        let sorted = derive_sorted(&records, &schema(), &SortDirective::asc("price")).unwrap();
        assert_eq!(ids(&sorted), vec![3, 1, 2]);
    }

    #[test]
    fn test_text_ignores_case() {
        let records = vec![
            Record::with_id(RecordId(1)).set("name", "beta"),
            Record::with_id(RecordId(2)).set("name", "Alpha"),
            Record::with_id(RecordId(3)).set("name", "alpha"),
        ];
        let sorted = derive_sorted(&records, &schema(), &SortDirective::asc("name")).unwrap();
        // Stable on ties.
        assert_eq!(ids(&sorted), vec![2, 3, 1]);
    }

    #[test]
    fn test_descending_is_exact_reverse_without_ties() {
        let records = vec![
            Record::with_id(RecordId(1)).set("name", "c"),
            Record::with_id(RecordId(2)).set("name", "a"),
            Record::with_id(RecordId(3)).set("name", "b"),
        ];
        let asc = derive_sorted(&records, &schema(), &SortDirective::asc("name")).unwrap();
        let mut desc = derive_sorted(&records, &schema(), &SortDirective::desc("name")).unwrap();
        desc.reverse();
        assert_eq!(ids(&asc), ids(&desc));
    }

    #[test]
    fn test_sort_by_identifier_descending() {
        let records = vec![Record::with_id(RecordId(3)), Record::with_id(RecordId(10)), Record::with_id(RecordId(7))];
        let sorted = derive_sorted(&records, &schema(), &SortDirective::desc("id")).unwrap();
        assert_eq!(ids(&sorted), vec![10, 7, 3]);
    }

    #[test]
    fn test_dates_sort_chronologically_with_missing_first() {
        let records = vec![
            Record::with_id(RecordId(1)).set("created_at", "2024-05-01T00:00:00+00:00"),
            Record::with_id(RecordId(2)).set("created_at", Value::Null),
            Record::with_id(RecordId(3)).set("created_at", "2023-12-31T23:59:59+00:00"),
        ];
        let sorted = derive_sorted(&records, &schema(), &SortDirective::asc("created_at")).unwrap();
        assert_eq!(ids(&sorted), vec![2, 3, 1]);
    }

    #[test]
    fn test_undeclared_field_is_rejected() {
        let records = vec![Record::with_id(RecordId(1))];
        let err = derive_sorted(&records, &schema(), &SortDirective::asc("color")).unwrap_err();
        assert!(matches!(err, FieldError::Undeclared { .. }));
    }
}
