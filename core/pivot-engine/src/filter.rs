//! FILENAME: core/pivot-engine/src/filter.rs
//! Filter Stage - turns the source rows into the working row set.
//!
//! Also hosts the structural guard for untyped input: `parse_rows` is the
//! only place a compute call can fail.

use rustc_hash::FxHashSet;

use crate::definition::FilterConfig;
use crate::error::PivotError;
use crate::value::{FieldValue, Row, RowId};

/// Keeps the rows that pass every filter with a non-empty selection.
///
/// An empty selection is pass-through ("unselect all" means no restriction).
/// Values are compared by the same bucket value grouping uses, so blanks
/// (null, whitespace, or a field absent from the schema) read as "" and only
/// match a selection containing "".
pub fn apply_filters<'a>(rows: &'a [Row], filters: &[FilterConfig]) -> Vec<&'a Row> {
    let active: Vec<(&str, FxHashSet<&str>)> = filters
        .iter()
        .filter(|f| !f.selected_values.is_empty())
        .map(|f| {
            let selected = f.selected_values.iter().map(String::as_str).collect();
            (f.field.as_str(), selected)
        })
        .collect();

    if active.is_empty() {
        return rows.iter().collect();
    }

    rows.iter()
        .filter(|row| {
            active
                .iter()
                .all(|(field, selected)| selected.contains(row.get(field).group_key().as_str()))
        })
        .collect()
}

/// Converts an untyped JSON row set into rows. Row ids are array indices.
///
/// Anything other than an array of objects is a programmer error and fails
/// the whole call.
pub fn parse_rows(json: &serde_json::Value) -> Result<Vec<Row>, PivotError> {
    let items = json.as_array().ok_or_else(|| {
        PivotError::InvalidRows(format!(
            "expected an array of row objects, found {}",
            json_kind(json)
        ))
    })?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let object = item.as_object().ok_or_else(|| PivotError::InvalidRow {
                index,
                message: format!("expected an object, found {}", json_kind(item)),
            })?;
            let id = RowId::try_from(index).map_err(|_| {
                PivotError::InvalidRows(format!("row count exceeds {}", RowId::MAX))
            })?;
            let values = object
                .iter()
                .map(|(field, value)| (field.clone(), FieldValue::from_json(value)))
                .collect();
            Ok(Row { id, values })
        })
        .collect()
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
