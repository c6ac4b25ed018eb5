//! FILENAME: core/pivot-engine/src/rollup.rs
//! Rollup Stage - subtotal and grand-total nodes and their cells.
//!
//! Subtotals are a trailing synthetic child of every non-leaf group; grand
//! totals are a trailing top-level node. Their cells are recomputed from the
//! raw members of each intersection, never summed from child aggregates, so
//! averages, extremes, distinct counts and deviations stay correct.

use rustc_hash::FxHashMap;

use crate::aggregate::{aggregate_cell, bucket_by_column, ColumnIndex};
use crate::definition::{PivotOptions, ValueFieldConfig};
use crate::grouping::{subtotal_key, GroupTree, GRAND_TOTAL_KEY};
use crate::measures::CompiledMeasures;
use crate::result::{leaf_keys, DataMatrix, HeaderNode};
use crate::value::{RowId, RowsById};

/// Inserts subtotal and grand-total nodes (with membership) into one axis.
/// An implicit root already is the grand total and gets nothing.
pub fn add_rollup_nodes(
    tree: &mut GroupTree,
    all_rows: &[RowId],
    show_subtotals: bool,
    show_grand_total: bool,
) {
    if tree.is_implicit_root() {
        return;
    }
    if show_subtotals {
        insert_subtotals(&mut tree.nodes, &mut tree.membership);
    }
    if show_grand_total {
        tree.membership
            .insert(GRAND_TOTAL_KEY.to_string(), all_rows.to_vec());
        tree.nodes.push(HeaderNode::grand_total());
    }
}

fn insert_subtotals(nodes: &mut [HeaderNode], membership: &mut FxHashMap<String, Vec<RowId>>) {
    for node in nodes.iter_mut() {
        if node.children.is_empty() {
            continue;
        }
        insert_subtotals(&mut node.children, membership);

        let key = subtotal_key(&node.key);
        let members = membership.get(&node.key).cloned().unwrap_or_default();
        membership.insert(key.clone(), members);

        node.children.push(HeaderNode {
            key,
            label: format!("{} Total", node.label),
            level: node.level + 1,
            children: Vec::new(),
            is_subtotal: true,
            is_grand_total: false,
            original_values: node.original_values.clone(),
        });
    }
}

/// Row id -> every column node (leaf, subtotal, grand total) containing it.
fn full_column_index(columns: &GroupTree) -> ColumnIndex<'_> {
    let mut index = ColumnIndex::default();
    for key in leaf_keys(&columns.nodes) {
        for id in columns.members(key) {
            index.entry(*id).or_default().push(key);
        }
    }
    index
}

/// Adds the rollup nodes requested by `options` to both trees, then
/// computes every cell involving a subtotal or grand total.
#[allow(clippy::too_many_arguments)]
pub fn materialize_rollups(
    rows: &mut GroupTree,
    columns: &mut GroupTree,
    matrix: &mut DataMatrix,
    all_rows: &[RowId],
    rows_by_id: &RowsById<'_>,
    value_fields: &[ValueFieldConfig],
    measures: &CompiledMeasures,
    options: &PivotOptions,
) {
    add_rollup_nodes(
        rows,
        all_rows,
        options.show_row_subtotals,
        options.show_row_grand_totals,
    );
    add_rollup_nodes(
        columns,
        all_rows,
        options.show_column_subtotals,
        options.show_column_grand_totals,
    );

    let index = full_column_index(columns);
    let mut computed = 0usize;

    for row_key in leaf_keys(&rows.nodes) {
        let row_cells = matrix.entry(row_key.to_string()).or_default();
        for (col_key, ids) in bucket_by_column(rows.members(row_key), &index) {
            // leaf x leaf cells come from the aggregation stage
            if row_cells.contains_key(col_key) {
                continue;
            }
            let cell = aggregate_cell(&ids, rows_by_id, value_fields, measures);
            row_cells.insert(col_key.to_string(), cell);
            computed += 1;
        }
    }

    crate::log_debug!("PIVOT", "rollup cells computed={}", computed);
}
