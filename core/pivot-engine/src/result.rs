//! FILENAME: core/pivot-engine/src/result.rs
//! Pivot Result - what a compute call hands to the renderer and exporter.
//!
//! Layers:
//! - `HeaderNode`: one node of the row or column header tree
//! - `PivotDataCell`: measure key -> value for one (row, column) intersection
//! - `PivotResult`: both trees, the sparse matrix and the flat key orders
//!
//! The result is an immutable snapshot. Collapse state lives outside it
//! (`CollapseState`) and is only consulted when walking the visible layout.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::definition::PivotOptions;
use crate::grouping::GRAND_TOTAL_KEY;
use crate::value::{FieldValue, RowId};

/// (field, value) bindings accumulated down a node's path.
pub type OriginalValues = SmallVec<[(String, FieldValue); 4]>;

// ============================================================================
// HEADER TREE
// ============================================================================

/// A node in the row or column header tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderNode {
    /// Stable path key; also the row/column index into the data matrix.
    pub key: String,

    /// The group value, or the subtotal/grand-total label.
    pub label: String,

    /// 0-based depth.
    pub level: usize,

    /// Ordered children. A trailing subtotal child follows the groups.
    pub children: Vec<HeaderNode>,

    pub is_subtotal: bool,
    pub is_grand_total: bool,

    pub original_values: OriginalValues,
}

impl HeaderNode {
    /// True for nodes that own cells: leaves, subtotals and grand totals.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// True when the node has group children a renderer can collapse.
    pub fn is_expandable(&self) -> bool {
        self.children.iter().any(|c| !c.is_subtotal)
    }

    /// The trailing subtotal child, if subtotals are materialized.
    pub fn subtotal(&self) -> Option<&HeaderNode> {
        self.children.last().filter(|c| c.is_subtotal)
    }

    /// Depth-first search by key.
    pub fn find(&self, key: &str) -> Option<&HeaderNode> {
        if self.key == key {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(key))
    }
}

/// Depth-first search over a forest.
pub fn find_node<'a>(nodes: &'a [HeaderNode], key: &str) -> Option<&'a HeaderNode> {
    nodes.iter().find_map(|n| n.find(key))
}

/// Pre-order flattening: parent, its children, its trailing subtotal.
pub fn flatten_keys(nodes: &[HeaderNode]) -> Vec<String> {
    fn walk(nodes: &[HeaderNode], out: &mut Vec<String>) {
        for node in nodes {
            out.push(node.key.clone());
            walk(&node.children, out);
        }
    }
    let mut out = Vec::new();
    walk(nodes, &mut out);
    out
}

/// Keys of the nodes that own cells (leaves, subtotals, grand totals), pre-order.
pub fn leaf_keys(nodes: &[HeaderNode]) -> Vec<&str> {
    fn walk<'a>(nodes: &'a [HeaderNode], out: &mut Vec<&'a str>) {
        for node in nodes {
            if node.is_leaf() {
                out.push(node.key.as_str());
            } else {
                walk(&node.children, out);
            }
        }
    }
    let mut out = Vec::new();
    walk(nodes, &mut out);
    out
}

// ============================================================================
// DATA CELLS
// ============================================================================

/// Measure values of one intersection. `None` means "not computable".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PivotDataCell {
    pub values: FxHashMap<String, Option<f64>>,
}

impl PivotDataCell {
    pub fn new() -> Self {
        PivotDataCell::default()
    }

    pub fn insert(&mut self, measure: impl Into<String>, value: Option<f64>) {
        self.values.insert(measure.into(), value);
    }

    /// True when the measure was computed for this cell (even if null).
    pub fn contains(&self, measure: &str) -> bool {
        self.values.contains_key(measure)
    }

    /// The measure's value; absent and null both read as `None`.
    pub fn value(&self, measure: &str) -> Option<f64> {
        self.values.get(measure).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// rowKey -> colKey -> cell. Empty intersections are absent.
pub type DataMatrix = FxHashMap<String, FxHashMap<String, PivotDataCell>>;

// ============================================================================
// RESULT
// ============================================================================

/// Output of one compute call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotResult {
    pub row_headers_tree: Vec<HeaderNode>,
    pub column_headers_tree: Vec<HeaderNode>,
    pub data_matrix: DataMatrix,
    /// Pre-order rendering order of the row tree; grand total last.
    pub all_row_keys: Vec<String>,
    pub all_column_keys: Vec<String>,
    /// Value measure keys followed by calculated measure names.
    pub measure_keys: Vec<String>,
    /// Copy of the grand-total row (column key -> cell), when one exists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_grand_total: Option<FxHashMap<String, PivotDataCell>>,
}

impl PivotResult {
    pub fn cell(&self, row_key: &str, col_key: &str) -> Option<&PivotDataCell> {
        self.data_matrix.get(row_key)?.get(col_key)
    }

    pub fn value(&self, row_key: &str, col_key: &str, measure: &str) -> Option<f64> {
        self.cell(row_key, col_key)?.value(measure)
    }

    /// The grand-total row, keyed by column key.
    pub fn row_grand_total(&self) -> Option<&FxHashMap<String, PivotDataCell>> {
        self.row_grand_total.as_ref()
    }

    /// The grand-total column, keyed by row key. Empty when not materialized.
    pub fn column_grand_total(&self) -> FxHashMap<&str, &PivotDataCell> {
        self.data_matrix
            .iter()
            .filter_map(|(row_key, cols)| Some((row_key.as_str(), cols.get(GRAND_TOTAL_KEY)?)))
            .collect()
    }

    pub fn find_row_node(&self, key: &str) -> Option<&HeaderNode> {
        find_node(&self.row_headers_tree, key)
    }

    pub fn find_column_node(&self, key: &str) -> Option<&HeaderNode> {
        find_node(&self.column_headers_tree, key)
    }

    /// Number of materialized cells.
    pub fn cell_count(&self) -> usize {
        self.data_matrix.values().map(|cols| cols.len()).sum()
    }

    /// Row layout honouring a collapse set.
    pub fn visible_rows(&self, collapsed: &FxHashSet<String>) -> Vec<VisibleItem<'_>> {
        visible_items(&self.row_headers_tree, collapsed)
    }

    /// Column layout honouring a collapse set.
    pub fn visible_columns(&self, collapsed: &FxHashSet<String>) -> Vec<VisibleItem<'_>> {
        visible_items(&self.column_headers_tree, collapsed)
    }
}

/// Result of a drill-down operation (the source rows behind one cell).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillDownResult {
    pub row_key: String,
    pub column_key: String,

    /// Matching row ids in source order, at most `max_records` of them.
    pub source_rows: Vec<RowId>,

    /// Total count of matching rows.
    pub total_count: usize,

    pub is_truncated: bool,
    pub max_records: usize,
}

// ============================================================================
// ASSEMBLY
// ============================================================================

/// Result Assembly: restructures the trees and matrix into one value.
/// Performs no aggregation.
pub fn assemble(
    row_tree: Vec<HeaderNode>,
    column_tree: Vec<HeaderNode>,
    mut data_matrix: DataMatrix,
    measure_keys: Vec<String>,
) -> PivotResult {
    let all_row_keys = flatten_keys(&row_tree);
    let all_column_keys = flatten_keys(&column_tree);

    // Parent label rows own no cells but still get an entry.
    for key in &all_row_keys {
        data_matrix.entry(key.clone()).or_default();
    }

    let row_grand_total = data_matrix.get(GRAND_TOTAL_KEY).cloned();

    PivotResult {
        row_headers_tree: row_tree,
        column_headers_tree: column_tree,
        data_matrix,
        all_row_keys,
        all_column_keys,
        measure_keys,
        row_grand_total,
    }
}

// ============================================================================
// COLLAPSE STATE & VISIBLE LAYOUT
// ============================================================================

/// Renderer-owned set of collapsed node keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollapseState {
    pub rows: FxHashSet<String>,
    pub columns: FxHashSet<String>,
}

impl CollapseState {
    /// Initial collapse state seeded from `default_*_subtotals_collapsed`.
    pub fn from_defaults(result: &PivotResult, options: &PivotOptions) -> Self {
        let mut state = CollapseState::default();
        if options.default_row_subtotals_collapsed {
            collect_expandable(&result.row_headers_tree, &mut state.rows);
        }
        if options.default_column_subtotals_collapsed {
            collect_expandable(&result.column_headers_tree, &mut state.columns);
        }
        state
    }

    /// Flips a row node; returns true when it is now collapsed.
    pub fn toggle_row(&mut self, key: &str) -> bool {
        toggle(&mut self.rows, key)
    }

    /// Flips a column node; returns true when it is now collapsed.
    pub fn toggle_column(&mut self, key: &str) -> bool {
        toggle(&mut self.columns, key)
    }
}

fn toggle(set: &mut FxHashSet<String>, key: &str) -> bool {
    if set.remove(key) {
        false
    } else {
        set.insert(key.to_string());
        true
    }
}

fn collect_expandable(nodes: &[HeaderNode], out: &mut FxHashSet<String>) {
    for node in nodes {
        if node.is_expandable() {
            out.insert(node.key.clone());
            collect_expandable(&node.children, out);
        }
    }
}

/// One row or column in rendering order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleItem<'a> {
    pub node: &'a HeaderNode,
    /// Matrix key to read values from; `None` for expanded parents, and for
    /// collapsed parents without a materialized subtotal.
    pub data_key: Option<&'a str>,
    pub is_collapsed: bool,
}

fn visible_items<'a>(nodes: &'a [HeaderNode], collapsed: &FxHashSet<String>) -> Vec<VisibleItem<'a>> {
    fn walk<'a>(nodes: &'a [HeaderNode], collapsed: &FxHashSet<String>, out: &mut Vec<VisibleItem<'a>>) {
        for node in nodes {
            if !node.is_expandable() {
                out.push(VisibleItem {
                    node,
                    data_key: Some(node.key.as_str()),
                    is_collapsed: false,
                });
            } else if collapsed.contains(&node.key) {
                out.push(VisibleItem {
                    node,
                    data_key: node.subtotal().map(|s| s.key.as_str()),
                    is_collapsed: true,
                });
            } else {
                out.push(VisibleItem {
                    node,
                    data_key: None,
                    is_collapsed: false,
                });
                walk(&node.children, collapsed, out);
            }
        }
    }
    let mut out = Vec::new();
    walk(nodes, collapsed, &mut out);
    out
}
