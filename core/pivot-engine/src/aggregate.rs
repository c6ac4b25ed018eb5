//! FILENAME: core/pivot-engine/src/aggregate.rs
//! Aggregation Stage - one scalar per value field for every leaf intersection.
//!
//! Reductions run through `AggregateAccumulator`, which folds a value stream
//! in one pass (Welford's algorithm for the standard deviation). Non-numeric
//! values are simply left out of the numeric reductions.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::{smallvec, SmallVec};

use crate::definition::{AggregationKind, ValueFieldConfig};
use crate::grouping::GroupTree;
use crate::measures::CompiledMeasures;
use crate::result::{leaf_keys, DataMatrix, PivotDataCell};
use crate::value::{FieldValue, RowId, RowsById};

// ============================================================================
// ACCUMULATOR
// ============================================================================

/// Running state of every supported reduction over one value stream.
#[derive(Debug, Clone, Default)]
pub struct AggregateAccumulator {
    /// Every value seen, including nulls.
    pub count: u64,
    pub count_non_empty: u64,
    pub count_numbers: u64,
    pub sum: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// For stdev: running mean and sum of squared differences from it.
    pub mean: f64,
    pub m2: f64,
    /// Distinct coerced values; only tracked when a unique count is needed.
    distinct: Option<FxHashSet<String>>,
}

impl AggregateAccumulator {
    /// An accumulator that can answer every kind.
    pub fn new() -> Self {
        AggregateAccumulator {
            distinct: Some(FxHashSet::default()),
            ..Default::default()
        }
    }

    /// An accumulator that skips distinct tracking unless `kind` needs it.
    pub fn for_kind(kind: AggregationKind) -> Self {
        if kind == AggregationKind::UniqueCount {
            Self::new()
        } else {
            Self::default()
        }
    }

    pub fn add(&mut self, value: &FieldValue) {
        self.count += 1;
        if value.is_empty() {
            return;
        }
        self.count_non_empty += 1;

        if let Some(distinct) = &mut self.distinct {
            distinct.insert(value.to_key_string());
        }
        if let Some(n) = value.as_number() {
            self.add_number(n);
        }
    }

    fn add_number(&mut self, value: f64) {
        self.count_numbers += 1;
        self.sum += value;

        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));

        // Welford's algorithm for variance
        let delta = value - self.mean;
        self.mean += delta / (self.count_numbers as f64);
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    /// Computes the final aggregate; `None` when it is not defined.
    pub fn compute(&self, kind: AggregationKind) -> Option<f64> {
        let has_numbers = self.count_numbers > 0;
        match kind {
            AggregationKind::Count => Some(self.count as f64),
            AggregationKind::CountNonEmpty => Some(self.count_non_empty as f64),
            AggregationKind::UniqueCount => self.distinct.as_ref().map(|d| d.len() as f64),
            AggregationKind::Sum => has_numbers.then_some(self.sum),
            AggregationKind::Average => {
                has_numbers.then(|| self.sum / (self.count_numbers as f64))
            }
            AggregationKind::Min => self.min,
            AggregationKind::Max => self.max,
            AggregationKind::Stdev => {
                if self.count_numbers > 1 {
                    Some((self.m2 / ((self.count_numbers - 1) as f64)).sqrt())
                } else {
                    None
                }
            }
        }
    }
}

/// Pure reduction of a value stream.
pub fn aggregate_values<'v>(
    kind: AggregationKind,
    values: impl IntoIterator<Item = &'v FieldValue>,
) -> Option<f64> {
    let mut acc = AggregateAccumulator::for_kind(kind);
    for value in values {
        acc.add(value);
    }
    acc.compute(kind)
}

// ============================================================================
// CELLS
// ============================================================================

/// Computes one cell from its member rows: every value field, then every
/// calculated measure over those aggregates.
pub fn aggregate_cell(
    members: &[RowId],
    rows_by_id: &RowsById<'_>,
    value_fields: &[ValueFieldConfig],
    measures: &CompiledMeasures,
) -> PivotDataCell {
    let mut cell = PivotDataCell::new();
    for vf in value_fields {
        let values = members
            .iter()
            .filter_map(|id| rows_by_id.get(id))
            .map(|row| row.get(&vf.field));
        cell.insert(vf.measure_key(), aggregate_values(vf.aggregation, values));
    }
    if !measures.is_empty() {
        measures.evaluate_into(&mut cell, value_fields);
    }
    cell
}

/// Row id -> keys of the column nodes whose cells include that row.
pub type ColumnIndex<'k> = FxHashMap<RowId, SmallVec<[&'k str; 4]>>;

/// Column index over the leaves only (one key per row).
pub fn leaf_column_index(columns: &GroupTree) -> ColumnIndex<'_> {
    columns
        .leaf_of
        .iter()
        .map(|(id, key)| (*id, smallvec![key.as_str()]))
        .collect()
}

/// Splits `members` by the column nodes that contain each row.
/// Only non-empty intersections come back, in order of first appearance.
pub fn bucket_by_column<'k>(members: &[RowId], index: &ColumnIndex<'k>) -> Vec<(&'k str, Vec<RowId>)> {
    let mut buckets: Vec<(&'k str, Vec<RowId>)> = Vec::new();
    let mut slot: FxHashMap<&'k str, usize> = FxHashMap::default();

    for id in members {
        let Some(keys) = index.get(id) else {
            continue;
        };
        for &key in keys {
            let i = *slot.entry(key).or_insert_with(|| {
                buckets.push((key, Vec::new()));
                buckets.len() - 1
            });
            buckets[i].1.push(*id);
        }
    }

    buckets
}

/// Computes every row-leaf x column-leaf cell with a non-empty intersection.
pub fn aggregate_leaves(
    rows: &GroupTree,
    columns: &GroupTree,
    rows_by_id: &RowsById<'_>,
    value_fields: &[ValueFieldConfig],
    measures: &CompiledMeasures,
) -> DataMatrix {
    let index = leaf_column_index(columns);
    let mut matrix = DataMatrix::default();

    for row_key in leaf_keys(&rows.nodes) {
        let cells = bucket_by_column(rows.members(row_key), &index)
            .into_iter()
            .map(|(col_key, ids)| {
                let cell = aggregate_cell(&ids, rows_by_id, value_fields, measures);
                (col_key.to_string(), cell)
            })
            .collect();
        matrix.insert(row_key.to_string(), cells);
    }

    matrix
}
