//! FILENAME: core/pivot-engine/src/error.rs

use thiserror::Error;

/// Fatal failures of a compute call. The caller keeps its previous result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PivotError {
    #[error("invalid row set: {0}")]
    InvalidRows(String),

    #[error("invalid row at index {index}: {message}")]
    InvalidRow { index: usize, message: String },

    #[error("unknown pivot view: {0}")]
    UnknownView(u32),
}

/// Which configuration area a problem was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigArea {
    Rows,
    Columns,
    Values,
    Filters,
}

impl std::fmt::Display for ConfigArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ConfigArea::Rows => "rows",
            ConfigArea::Columns => "columns",
            ConfigArea::Values => "values",
            ConfigArea::Filters => "filters",
        })
    }
}

/// Validation failures reported to the configuration editor.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("field '{field}' appears more than once in {area}")]
    DuplicateField { area: ConfigArea, field: String },

    #[error("field '{field}' is used in both {first} and {second}")]
    FieldInSeveralAreas {
        field: String,
        first: ConfigArea,
        second: ConfigArea,
    },

    #[error("unknown field '{field}' in {area}")]
    UnknownField { area: ConfigArea, field: String },

    #[error("calculated measure name '{name}' is used more than once")]
    DuplicateMeasureName { name: String },

    #[error("calculated measure name '{name}' collides with a value measure")]
    MeasureNameCollision { name: String },

    #[error("calculated measure '{name}' has an invalid formula: {message}")]
    InvalidFormula { name: String, message: String },

    #[error("calculated measure '{name}' references unknown measure '{reference}'")]
    UnknownReference { name: String, reference: String },
}
