//! Rendering of query results.
//!
//! Rows keep the key order produced by the query (SELECT-list order, or the
//! record's own order for `SELECT *`).
//!
//! # Examples
//!
//! ```
//! use mql_lang::QueryResult;
//! use mql_lang::output::{to_json, to_table};
//! use serde_json::json;
//!
//! let row = json!({"file": "/images/lena.jpg", "height": 512});
//! let result = QueryResult {
//!     columns: vec!["file".to_string(), "height".to_string()],
//!     rows: vec![row.as_object().unwrap().clone()],
//! };
//!
//! assert_eq!(to_json(&result), r#"[{"file":"/images/lena.jpg","height":512}]"#);
//! assert_eq!(
//!     to_table(&result),
//!     "file             | height\n-----------------+-------\n/images/lena.jpg | 512   \n"
//! );
//! ```

use serde_json::Value;

use crate::executor::QueryResult;

/// How a result is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Json,
    JsonPretty,
    Table,
}

pub fn render(result: &QueryResult, format: Format) -> String {
    match format {
        Format::Json => to_json(result),
        Format::JsonPretty => to_json_pretty(result),
        Format::Table => to_table(result),
    }
}

fn rows_value(result: &QueryResult) -> Value {
    Value::Array(result.rows.iter().cloned().map(Value::Object).collect())
}

/// Rows as one compact JSON array.
pub fn to_json(result: &QueryResult) -> String {
    rows_value(result).to_string()
}

/// Rows as a JSON array with 2-space indentation.
pub fn to_json_pretty(result: &QueryResult) -> String {
    // Serializing a Value cannot fail
    serde_json::to_string_pretty(&rows_value(result)).unwrap_or_default()
}

/// Plain-text table: a header row, a rule, then one line per row.
///
/// Strings are shown without quotes and nulls as empty cells.
pub fn to_table(result: &QueryResult) -> String {
    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| {
            result
                .columns
                .iter()
                .map(|column| cell(row.get(column)))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = result
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(column.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    push_line(&mut out, result.columns.iter().map(String::as_str), &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&rule.join("-+-"));
    out.push('\n');
    for row in &cells {
        push_line(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect();
    out.push_str(&padded.join(" | "));
    out.push('\n');
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
