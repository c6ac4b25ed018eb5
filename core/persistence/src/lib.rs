//! FILENAME: core/persistence/src/lib.rs
//! Pivot Persistence Module
//!
//! Saves and loads pivot templates (JSON) and writes flattened pivots to XLSX.
//! Results themselves are never persisted; they are recomputed on load.

mod error;
mod templates;
mod xlsx_writer;

pub use error::PersistenceError;
pub use templates::{PivotTemplate, TemplateStore, TEMPLATE_FORMAT_VERSION};
pub use xlsx_writer::save_pivot_xlsx;
