//! FILENAME: core/pivot-engine/src/engine.rs
//! Pivot Engine - the pipeline that turns rows and a config into a PivotResult.
//!
//! Algorithm:
//! 1. Filter the source rows (empty selections pass everything)
//! 2. Build the row and column header trees from the working rows
//! 3. Aggregate every non-empty row-leaf x column-leaf intersection
//! 4. Insert subtotal/grand-total nodes and compute their cells from raw members
//! 5. Assemble trees, matrix and flat key orders into the result
//!
//! Every call is a pure function of its inputs; nothing survives between calls.

use rustc_hash::FxHashSet;

use crate::aggregate::aggregate_leaves;
use crate::definition::{PivotConfig, PivotOptions};
use crate::error::PivotError;
use crate::filter::{apply_filters, parse_rows};
use crate::grouping::build_group_tree;
use crate::measures::CompiledMeasures;
use crate::result::{assemble, DrillDownResult, PivotResult};
use crate::rollup::{add_rollup_nodes, materialize_rollups};
use crate::value::{index_rows, Row, RowId};
use crate::{log_debug, log_enter, log_exit};

// ============================================================================
// PIVOT CALCULATOR
// ============================================================================

/// The main calculation engine for one compute call.
pub struct PivotCalculator<'a> {
    rows: &'a [Row],
    config: &'a PivotConfig,
    options: &'a PivotOptions,

    /// Calculated measures, parsed once for the whole call.
    measures: CompiledMeasures,
}

impl<'a> PivotCalculator<'a> {
    /// Creates a new calculator instance.
    pub fn new(rows: &'a [Row], config: &'a PivotConfig, options: &'a PivotOptions) -> Self {
        PivotCalculator {
            rows,
            config,
            options,
            measures: CompiledMeasures::compile(&config.calculated_measures),
        }
    }

    /// Executes the full calculation and returns the result.
    pub fn calculate(&self) -> PivotResult {
        log_enter!(
            "PIVOT",
            "calculate",
            "rows={} rowFields={} colFields={} values={} measures={}",
            self.rows.len(),
            self.config.rows.len(),
            self.config.columns.len(),
            self.config.values.len(),
            self.measures.len()
        );

        // Step 1: Filter
        let filtered = apply_filters(self.rows, &self.config.filters);
        let all_ids: Vec<RowId> = filtered.iter().map(|r| r.id).collect();
        let rows_by_id = index_rows(&filtered);
        log_debug!("PIVOT", "filtered {} -> {} rows", self.rows.len(), filtered.len());

        // Step 2: Group
        let mut row_tree = build_group_tree(&filtered, &self.config.rows);
        let mut col_tree = build_group_tree(&filtered, &self.config.columns);

        // Step 3: Aggregate leaves
        let mut matrix = aggregate_leaves(
            &row_tree,
            &col_tree,
            &rows_by_id,
            &self.config.values,
            &self.measures,
        );
        log_debug!("PIVOT", "leaf rows with cells={}", matrix.len());

        // Step 4: Rollups
        materialize_rollups(
            &mut row_tree,
            &mut col_tree,
            &mut matrix,
            &all_ids,
            &rows_by_id,
            &self.config.values,
            &self.measures,
            self.options,
        );

        // Step 5: Assemble
        let result = assemble(
            row_tree.nodes,
            col_tree.nodes,
            matrix,
            self.config.measure_keys(),
        );

        log_exit!(
            "PIVOT",
            "calculate",
            "rowKeys={} colKeys={} cells={}",
            result.all_row_keys.len(),
            result.all_column_keys.len(),
            result.cell_count()
        );
        result
    }
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Calculates a pivot from typed rows.
/// This is the main entry point for the calculation engine.
pub fn calculate_pivot(rows: &[Row], config: &PivotConfig, options: &PivotOptions) -> PivotResult {
    PivotCalculator::new(rows, config, options).calculate()
}

/// Calculates a pivot from an untyped JSON row set.
///
/// Fails only when `rows` is not an array of objects; the caller keeps its
/// previous result in that case.
pub fn calculate_pivot_json(
    rows: &serde_json::Value,
    config: &PivotConfig,
    options: &PivotOptions,
) -> Result<PivotResult, PivotError> {
    let rows = parse_rows(rows).inspect_err(|e| {
        crate::log_warn!("PIVOT", "rejected row set: {}", e);
    })?;
    Ok(calculate_pivot(&rows, config, options))
}

/// Returns the source rows behind one cell.
///
/// Runs only the filter and grouping stages. Subtotal and grand-total keys
/// resolve whether or not the options showed them. Unknown keys match nothing.
pub fn drill_down(
    rows: &[Row],
    config: &PivotConfig,
    row_key: &str,
    col_key: &str,
    max_records: usize,
) -> DrillDownResult {
    let filtered = apply_filters(rows, &config.filters);
    let all_ids: Vec<RowId> = filtered.iter().map(|r| r.id).collect();

    let mut row_tree = build_group_tree(&filtered, &config.rows);
    let mut col_tree = build_group_tree(&filtered, &config.columns);
    add_rollup_nodes(&mut row_tree, &all_ids, true, true);
    add_rollup_nodes(&mut col_tree, &all_ids, true, true);

    let in_column: FxHashSet<RowId> = col_tree.members(col_key).iter().copied().collect();
    let matches: Vec<RowId> = row_tree
        .members(row_key)
        .iter()
        .copied()
        .filter(|id| in_column.contains(id))
        .collect();

    let total_count = matches.len();
    let mut source_rows = matches;
    source_rows.truncate(max_records);

    DrillDownResult {
        row_key: row_key.to_string(),
        column_key: col_key.to_string(),
        source_rows,
        total_count,
        is_truncated: total_count > max_records,
        max_records,
    }
}
