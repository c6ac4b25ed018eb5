//! FILENAME: core/pivot-engine/src/definition.rs
//! Pivot Definition - The serializable configuration.
//!
//! This module contains all the types needed to DESCRIBE a pivot.
//! These structures are designed to be:
//! - Serializable (JSON, camelCase, for saved templates and the editor)
//! - Immutable snapshots of user intent
//! - Never mutated by the engine

use serde::{Deserialize, Serialize};

// ============================================================================
// AGGREGATION
// ============================================================================

/// Supported aggregation functions for value fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AggregationKind {
    #[default]
    Sum,
    Count,
    Average,
    Min,
    Max,
    UniqueCount,
    /// Sample standard deviation (n - 1).
    Stdev,
    CountNonEmpty,
}

impl AggregationKind {
    pub const ALL: [AggregationKind; 8] = [
        AggregationKind::Sum,
        AggregationKind::Count,
        AggregationKind::Average,
        AggregationKind::Min,
        AggregationKind::Max,
        AggregationKind::UniqueCount,
        AggregationKind::Stdev,
        AggregationKind::CountNonEmpty,
    ];

    /// Name used in measure keys ("Sum of sales").
    pub fn display_name(self) -> &'static str {
        match self {
            AggregationKind::Sum => "Sum",
            AggregationKind::Count => "Count",
            AggregationKind::Average => "Average",
            AggregationKind::Min => "Min",
            AggregationKind::Max => "Max",
            AggregationKind::UniqueCount => "Unique Count",
            AggregationKind::Stdev => "StdDev",
            AggregationKind::CountNonEmpty => "Count Non-Empty",
        }
    }

    /// Whether a parent's value equals the sum of its children's values.
    pub fn is_additive(self) -> bool {
        matches!(
            self,
            AggregationKind::Sum | AggregationKind::Count | AggregationKind::CountNonEmpty
        )
    }
}

impl std::fmt::Display for AggregationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

// ============================================================================
// FIELD DEFINITIONS
// ============================================================================

/// Sort order for the items of a grouping field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    /// Lexical order of the coerced string value; blanks first.
    #[default]
    Ascending,
    Descending,
    /// Order of first appearance in the source rows.
    DataSourceOrder,
}

/// A field placed in the Row or Column area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotFieldConfig {
    /// Source field name.
    pub field: String,

    /// Carried for the editor; grouping ignores it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<AggregationKind>,

    #[serde(default)]
    pub sort_order: SortOrder,
}

impl PivotFieldConfig {
    pub fn new(field: impl Into<String>) -> Self {
        PivotFieldConfig {
            field: field.into(),
            aggregation: None,
            sort_order: SortOrder::Ascending,
        }
    }

    pub fn sorted(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = sort_order;
        self
    }
}

/// A field placed in the Values area with its aggregation function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueFieldConfig {
    pub field: String,
    #[serde(default)]
    pub aggregation: AggregationKind,
}

impl ValueFieldConfig {
    pub fn new(field: impl Into<String>, aggregation: AggregationKind) -> Self {
        ValueFieldConfig {
            field: field.into(),
            aggregation,
        }
    }

    /// Key of this measure inside a PivotDataCell, e.g. "Sum of sales".
    pub fn measure_key(&self) -> String {
        format!("{} of {}", self.aggregation.display_name(), self.field)
    }
}

/// A pre-aggregation filter: keep rows whose value is in `selected_values`.
/// An empty selection means "no restriction".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    pub field: String,
    #[serde(default)]
    pub selected_values: Vec<String>,
}

impl FilterConfig {
    pub fn new<S: Into<String>>(field: impl Into<String>, selected: impl IntoIterator<Item = S>) -> Self {
        FilterConfig {
            field: field.into(),
            selected_values: selected.into_iter().map(Into::into).collect(),
        }
    }
}

/// A measure derived from other measures of the same cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedMeasure {
    pub id: String,
    pub name: String,
    pub formula: String,
}

impl CalculatedMeasure {
    pub fn new(id: impl Into<String>, name: impl Into<String>, formula: impl Into<String>) -> Self {
        CalculatedMeasure {
            id: id.into(),
            name: name.into(),
            formula: formula.into(),
        }
    }
}

// ============================================================================
// MAIN CONFIG STRUCT
// ============================================================================

/// The complete, serializable description of a pivot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotConfig {
    /// Fields placed in the Row area (ordered from outer to inner).
    #[serde(default)]
    pub rows: Vec<PivotFieldConfig>,

    /// Fields placed in the Column area (ordered from outer to inner).
    #[serde(default)]
    pub columns: Vec<PivotFieldConfig>,

    #[serde(default)]
    pub values: Vec<ValueFieldConfig>,

    #[serde(default)]
    pub filters: Vec<FilterConfig>,

    #[serde(default)]
    pub calculated_measures: Vec<CalculatedMeasure>,
}

impl PivotConfig {
    /// Measure keys of the value fields, in configuration order.
    pub fn value_measure_keys(&self) -> Vec<String> {
        self.values.iter().map(ValueFieldConfig::measure_key).collect()
    }

    /// All measure keys a cell can hold: value fields first, then calculated measures.
    pub fn measure_keys(&self) -> Vec<String> {
        let mut keys = self.value_measure_keys();
        keys.extend(self.calculated_measures.iter().map(|m| m.name.clone()));
        keys
    }

    /// Every source field the config mentions, in area order, without repeats.
    pub fn referenced_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = Vec::new();
        let all = self
            .rows
            .iter()
            .map(|f| f.field.as_str())
            .chain(self.columns.iter().map(|f| f.field.as_str()))
            .chain(self.values.iter().map(|f| f.field.as_str()))
            .chain(self.filters.iter().map(|f| f.field.as_str()));
        for field in all {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        fields
    }
}

// ============================================================================
// OPTIONS
// ============================================================================

fn default_true() -> bool {
    true
}

/// Which rollup nodes are materialized, and the renderer's initial collapse state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotOptions {
    #[serde(default = "default_true")]
    pub show_row_grand_totals: bool,

    #[serde(default = "default_true")]
    pub show_column_grand_totals: bool,

    #[serde(default = "default_true")]
    pub show_row_subtotals: bool,

    #[serde(default = "default_true")]
    pub show_column_subtotals: bool,

    /// Seeds the renderer's collapse set; the engine still computes everything.
    #[serde(default)]
    pub default_row_subtotals_collapsed: bool,

    #[serde(default)]
    pub default_column_subtotals_collapsed: bool,
}

impl Default for PivotOptions {
    fn default() -> Self {
        PivotOptions {
            show_row_grand_totals: true,
            show_column_grand_totals: true,
            show_row_subtotals: true,
            show_column_subtotals: true,
            default_row_subtotals_collapsed: false,
            default_column_subtotals_collapsed: false,
        }
    }
}

impl PivotOptions {
    /// Options with every rollup turned off.
    pub fn without_totals() -> Self {
        PivotOptions {
            show_row_grand_totals: false,
            show_column_grand_totals: false,
            show_row_subtotals: false,
            show_column_subtotals: false,
            ..PivotOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_key() {
        let vf = ValueFieldConfig::new("sales", AggregationKind::Sum);
        assert_eq!(vf.measure_key(), "Sum of sales");
        let vf = ValueFieldConfig::new("customer", AggregationKind::UniqueCount);
        assert_eq!(vf.measure_key(), "Unique Count of customer");
    }

    #[test]
    fn test_config_from_camel_case_json() {
        let json = r#"{
            "rows": [{"field": "region"}],
            "columns": [{"field": "cat", "sortOrder": "descending"}],
            "values": [{"field": "sales", "aggregation": "unique_count"}],
            "filters": [{"field": "region", "selectedValues": ["East"]}],
            "calculatedMeasures": [{"id": "m1", "name": "double", "formula": "sales * 2"}]
        }"#;
        let config: PivotConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.rows[0], PivotFieldConfig::new("region"));
        assert_eq!(config.columns[0].sort_order, SortOrder::Descending);
        assert_eq!(config.values[0].aggregation, AggregationKind::UniqueCount);
        assert_eq!(config.filters[0].selected_values, vec!["East".to_string()]);
        assert_eq!(config.measure_keys(), vec!["Unique Count of sales", "double"]);
    }

    #[test]
    fn test_missing_lists_default_to_empty() {
        let config: PivotConfig = serde_json::from_str(r#"{"rows": [{"field": "a"}]}"#).unwrap();
        assert!(config.filters.is_empty());
        assert!(config.calculated_measures.is_empty());
    }

    #[test]
    fn test_options_default_from_empty_json() {
        let options: PivotOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, PivotOptions::default());
        assert!(options.show_row_subtotals);
        assert!(!options.default_row_subtotals_collapsed);
    }

    #[test]
    fn test_referenced_fields_are_unique() {
        let config = PivotConfig {
            rows: vec![PivotFieldConfig::new("region")],
            values: vec![ValueFieldConfig::new("sales", AggregationKind::Sum)],
            filters: vec![FilterConfig::new("region", ["East"])],
            ..Default::default()
        };
        assert_eq!(config.referenced_fields(), vec!["region", "sales"]);
    }
}
