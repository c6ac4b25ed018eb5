//! FILENAME: core/pivot-engine/src/value.rs
//! Source rows and their scalar values.
//!
//! Rows arrive from the data provider already imported; the engine only
//! reads them. Each row carries an id assigned at import time that the
//! engine never recomputes.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Stable identity of a source row.
pub type RowId = u32;

/// A scalar value of one field in one row.
/// Deserializes directly from plain JSON scalars.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

/// Numbers at or above this magnitude keep their float rendering.
const INTEGRAL_LIMIT: f64 = 1e15;

impl FieldValue {
    /// String coercion used for filtering, grouping and distinct counting.
    pub fn to_key_string(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < INTEGRAL_LIMIT {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            FieldValue::Text(s) => s.clone(),
        }
    }

    /// Bucket value used by filtering and grouping: every blank value
    /// (null, missing, whitespace) reads as "".
    pub fn group_key(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            self.to_key_string()
        }
    }

    /// Numeric coercion for sum/average/min/max/stdev.
    /// Booleans and blank text are non-numeric.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            FieldValue::Number(n) => *n,
            FieldValue::Text(s) => s.trim().parse::<f64>().ok()?,
            FieldValue::Null | FieldValue::Bool(_) => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Null, or a value whose trimmed string form is empty.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Null => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Bool(_) | FieldValue::Number(_) => false,
        }
    }

    /// Converts a JSON value. Nested arrays and objects keep their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(*b),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => FieldValue::Number(f),
                None => FieldValue::Text(n.to_string()),
            },
            serde_json::Value::String(s) => FieldValue::Text(s.clone()),
            other => FieldValue::Text(other.to_string()),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

static NULL_VALUE: FieldValue = FieldValue::Null;

/// One immutable source row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    pub values: FxHashMap<String, FieldValue>,
}

impl Row {
    pub fn new(id: RowId) -> Self {
        Row {
            id,
            values: FxHashMap::default(),
        }
    }

    /// Builder used by fixtures and callers assembling rows by hand.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.values.insert(field.into(), value.into());
        self
    }

    /// The value of `field`; absent fields read as Null.
    pub fn get(&self, field: &str) -> &FieldValue {
        self.values.get(field).unwrap_or(&NULL_VALUE)
    }
}

/// Row lookup by id, built once per compute from the filtered rows.
pub type RowsById<'a> = FxHashMap<RowId, &'a Row>;

pub fn index_rows<'a>(rows: &[&'a Row]) -> RowsById<'a> {
    rows.iter().map(|row| (row.id, *row)).collect()
}
