//! Plain-text and JSON rendering of collection views.

use backoffice_lib::model::CollectionSchema;
use backoffice_lib::model::ID_FIELD;
use backoffice_lib::model::Record;
use backoffice_lib::query::Direction;
use backoffice_lib::query::SortDirective;
use backoffice_lib::text::excerpt;

/// Widest a table cell may get before it is cut.
const MAX_COLUMN: usize = 32;

const COLUMN_GAP: &str = "  ";

/// Renders `rows` as an aligned table of `id` plus the displayed fields.
///
/// The active sort column is marked with an arrow.
pub fn table(schema: &CollectionSchema, rows: &[&Record], sort: &SortDirective) -> String {
    let mut columns = vec![ID_FIELD];
    columns.extend(schema.displayed_fields().map(|spec| spec.name.as_str()));

    let headers: Vec<String> = columns.iter().map(|c| header(c, sort)).collect();
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|record| columns.iter().map(|c| cell_text(&record.display(c))).collect())
        .collect();

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, head)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(head.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();

    let mut out = String::new();
    push_row(&mut out, &headers, &widths);
    push_row(&mut out, &rule, &widths);
    for row in &cells {
        push_row(&mut out, row, &widths);
    }
    out
}

/// Renders `rows` as a JSON array, identifier included.
pub fn records_json(rows: &[&Record]) -> serde_json::Value {
    rows.iter()
        .map(|record| {
            let mut object = serde_json::Map::new();
            if let Some(id) = record.id() {
                object.insert(ID_FIELD.to_string(), id.0.into());
            }
            for (name, value) in record.fields() {
                let value = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
                object.insert(name.clone(), value);
            }
            serde_json::Value::Object(object)
        })
        .collect()
}

fn header(column: &str, sort: &SortDirective) -> String {
    if sort.field != column {
        return column.to_string();
    }
    match sort.direction {
        Direction::Ascending => format!("{} ▲", column),
        Direction::Descending => format!("{} ▼", column),
    }
}

/// One line of plain text, cut to the column budget.
fn cell_text(raw: &str) -> String {
    let flat = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    excerpt(&flat, MAX_COLUMN)
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join(COLUMN_GAP);
    out.push_str(line.trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use backoffice_lib::model::FieldSpec;
    use backoffice_lib::model::RecordId;

    use super::*;

    fn schema() -> CollectionSchema {
        CollectionSchema::new("Items", "items")
            .field(FieldSpec::text("name"))
            .field(FieldSpec::numeric("price"))
            .field(FieldSpec::date("created_at").hidden())
    }

    #[test]
    fn test_table_layout() {
        let a = Record::with_id(RecordId(1)).set("name", "Ivory").set("price", 10i64);
        let b = Record::with_id(RecordId(12)).set("name", "<b>Kraft</b>\npaper");
        let out = table(&schema(), &[&a, &b], &SortDirective::asc("price"));

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "id  name         price ▲");
        assert_eq!(lines[1], "--  -----------  -------");
        assert_eq!(lines[2], "1   Ivory        10");
        assert_eq!(lines[3], "12  Kraft paper");
    }

    #[test]
    fn test_long_cells_are_cut() {
        let long = "x".repeat(100);
        let record = Record::with_id(RecordId(1)).set("name", long.as_str());
        let out = table(&schema(), &[&record], &SortDirective::desc("id"));

        assert!(out.lines().next().unwrap().starts_with("id ▼"));
        assert!(out.contains(&format!("{}...", "x".repeat(MAX_COLUMN))));
    }

    #[test]
    fn test_records_json_includes_id() {
        let record = Record::with_id(RecordId(4)).set("name", "Ivory");
        let json = records_json(&[&record]);
        assert_eq!(json[0]["id"], 4);
        assert_eq!(json[0]["name"], "Ivory");
    }
}
