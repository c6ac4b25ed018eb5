//! FILENAME: core/pivot-engine/src/lib.rs
//! Pivot aggregation engine.
//!
//! Turns a flat row set plus a pivot configuration into a hierarchical,
//! cross-tabulated result: header trees for both axes and a sparse matrix of
//! aggregated measures, including subtotals, grand totals and calculated
//! measures. Every compute is a pure, synchronous whole-pivot recompute.
//!
//! Layers:
//! - `value` / `definition`: rows and the serializable configuration
//! - `filter` -> `grouping` -> `aggregate` -> `rollup`: the pipeline stages
//! - `result`: what the renderer reads (trees, matrix, visible layout)
//! - `engine`: the pipeline entry points and drill-down
//! - `validation`, `export`, `views`: editor checks, grid export, view registry

pub mod logging;

pub mod aggregate;
pub mod definition;
pub mod engine;
pub mod error;
pub mod export;
pub mod filter;
pub mod grouping;
pub mod measures;
pub mod result;
pub mod rollup;
pub mod validation;
pub mod value;
pub mod views;

pub use definition::*;
pub use engine::{calculate_pivot, calculate_pivot_json, drill_down, PivotCalculator};
pub use error::{ConfigArea, ConfigError, PivotError};
pub use export::{flatten_to_grid, ExportCell, ExportGrid, ExportOptions};
pub use grouping::{child_key, subtotal_key, BLANK_LABEL, GRAND_TOTAL_KEY, GRAND_TOTAL_LABEL};
pub use result::{
    CollapseState, DataMatrix, DrillDownResult, HeaderNode, PivotDataCell, PivotResult, VisibleItem,
};
pub use validation::validate_config;
pub use value::{FieldValue, Row, RowId};
pub use views::{Completion, ComputeTicket, PivotView, PivotViews, ViewId};
