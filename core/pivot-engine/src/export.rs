//! FILENAME: core/pivot-engine/src/export.rs
//! Flattens a PivotResult into a 2D grid for spreadsheet export.
//!
//! Layout (compact form):
//! - one header row per column level, labels only on the first column they span
//! - one header row with the measure names
//! - one label column, indented by level, followed by the data columns
//!
//! Absent intersections export as `Blank`; computed-but-null values export as
//! `Missing`, rendered with `empty_cell_text`. A missing value is never `0`.

use serde::{Deserialize, Serialize};

use crate::result::{CollapseState, HeaderNode, PivotResult, VisibleItem};

/// One exported cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum ExportCell {
    /// No intersection (or a header area with nothing in it).
    Blank,
    Label(String),
    Number(f64),
    /// The measure exists for this cell but could not be computed.
    Missing,
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Text written for `Missing` cells.
    pub empty_cell_text: String,
    /// Caption of the label column in the measure-name row.
    pub row_header_caption: String,
    /// Indent added per row level in the label column.
    pub indent: String,
    /// Nodes the renderer currently shows collapsed.
    pub collapse: CollapseState,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            empty_cell_text: "(n/a)".to_string(),
            row_header_caption: "Row Labels".to_string(),
            indent: "  ".to_string(),
            collapse: CollapseState::default(),
        }
    }
}

/// A rectangular grid ready to be written cell by cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportGrid {
    pub cells: Vec<Vec<ExportCell>>,
    /// Leading rows that hold headers.
    pub header_rows: usize,
    pub empty_cell_text: String,
}

impl ExportGrid {
    pub fn height(&self) -> usize {
        self.cells.len()
    }

    pub fn width(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&ExportCell> {
        self.cells.get(row)?.get(col)
    }

    /// Text rendering of one cell.
    pub fn display(&self, row: usize, col: usize) -> String {
        match self.get(row, col) {
            Some(ExportCell::Label(s)) => s.clone(),
            Some(ExportCell::Number(n)) => n.to_string(),
            Some(ExportCell::Missing) => self.empty_cell_text.clone(),
            Some(ExportCell::Blank) | None => String::new(),
        }
    }

    /// Tab-separated text, one line per grid row.
    pub fn to_tsv(&self) -> String {
        (0..self.height())
            .map(|r| {
                (0..self.width())
                    .map(|c| self.display(r, c))
                    .collect::<Vec<_>>()
                    .join("\t")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A visible data column with the labels of its path, outermost first.
/// `data_key` is `None` for a collapsed parent without a subtotal.
struct ExportColumn<'a> {
    data_key: Option<&'a str>,
    path: Vec<&'a str>,
}

fn collect_columns<'a>(
    nodes: &'a [HeaderNode],
    options: &ExportOptions,
    path: &mut Vec<&'a str>,
    out: &mut Vec<ExportColumn<'a>>,
) {
    for node in nodes {
        path.push(node.label.as_str());
        let collapsed = options.collapse.columns.contains(&node.key);
        if node.is_expandable() && !collapsed {
            collect_columns(&node.children, options, path, out);
        } else {
            let data_key = if node.is_expandable() {
                node.subtotal().map(|s| s.key.as_str())
            } else {
                Some(node.key.as_str())
            };
            out.push(ExportColumn {
                data_key,
                path: path.clone(),
            });
        }
        path.pop();
    }
}

/// Flattens the visible part of `result` into a grid.
pub fn flatten_to_grid(result: &PivotResult, options: &ExportOptions) -> ExportGrid {
    let mut columns = Vec::new();
    collect_columns(&result.column_headers_tree, options, &mut Vec::new(), &mut columns);

    let measures = &result.measure_keys;
    let width = 1 + columns.len() * measures.len();
    let depth = columns.iter().map(|c| c.path.len()).max().unwrap_or(0);

    let mut cells: Vec<Vec<ExportCell>> = Vec::new();

    // Column header rows
    for level in 0..depth {
        let mut row = Vec::with_capacity(width);
        row.push(ExportCell::Blank);
        for (i, column) in columns.iter().enumerate() {
            let label = column.path.get(level).copied();
            let starts_span = i == 0
                || columns[i - 1].path.get(..=level) != column.path.get(..=level);
            for m in 0..measures.len() {
                match label {
                    Some(label) if m == 0 && starts_span => {
                        row.push(ExportCell::Label(label.to_string()))
                    }
                    _ => row.push(ExportCell::Blank),
                }
            }
        }
        cells.push(row);
    }

    // Measure-name row
    let mut row = Vec::with_capacity(width);
    row.push(ExportCell::Label(options.row_header_caption.clone()));
    for _ in &columns {
        row.extend(measures.iter().map(|m| ExportCell::Label(m.clone())));
    }
    cells.push(row);
    let header_rows = cells.len();

    // Data rows
    for item in result.visible_rows(&options.collapse.rows) {
        cells.push(data_row(result, &item, &columns, options));
    }

    ExportGrid {
        cells,
        header_rows,
        empty_cell_text: options.empty_cell_text.clone(),
    }
}

fn data_row(
    result: &PivotResult,
    item: &VisibleItem<'_>,
    columns: &[ExportColumn<'_>],
    options: &ExportOptions,
) -> Vec<ExportCell> {
    let mut row = Vec::with_capacity(1 + columns.len() * result.measure_keys.len());
    row.push(ExportCell::Label(format!(
        "{}{}",
        options.indent.repeat(item.node.level),
        item.node.label
    )));

    for column in columns {
        let cell = item
            .data_key
            .zip(column.data_key)
            .and_then(|(row_key, col_key)| result.cell(row_key, col_key));
        for measure in &result.measure_keys {
            row.push(match cell {
                None => ExportCell::Blank,
                Some(cell) => match cell.value(measure) {
                    Some(v) => ExportCell::Number(v),
                    None => ExportCell::Missing,
                },
            });
        }
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{AggregationKind, PivotConfig, PivotFieldConfig, PivotOptions, ValueFieldConfig};
    use crate::engine::calculate_pivot;
    use crate::value::Row;

    fn sample() -> PivotResult {
        let rows = vec![
            Row::new(0).with("region", "East").with("cat", "A").with("sales", 10.0),
            Row::new(1).with("region", "East").with("cat", "B").with("sales", "oops"),
            Row::new(2).with("region", "West").with("cat", "A").with("sales", 5.0),
        ];
        let config = PivotConfig {
            rows: vec![PivotFieldConfig::new("region")],
            columns: vec![PivotFieldConfig::new("cat")],
            values: vec![ValueFieldConfig::new("sales", AggregationKind::Sum)],
            ..Default::default()
        };
        calculate_pivot(&rows, &config, &PivotOptions::default())
    }

    #[test]
    fn test_grid_shape() {
        let grid = flatten_to_grid(&sample(), &ExportOptions::default());
        // one column level + measure row, then East, West, Grand Total
        assert_eq!(grid.header_rows, 2);
        assert_eq!(grid.height(), 5);
        // label column + A, B, Grand Total
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.display(0, 1), "A");
        assert_eq!(grid.display(0, 3), "Grand Total");
        assert_eq!(grid.display(1, 0), "Row Labels");
        assert_eq!(grid.display(1, 1), "Sum of sales");
    }

    #[test]
    fn test_absent_vs_missing_cells() {
        let grid = flatten_to_grid(&sample(), &ExportOptions::default());
        // East x B exists but its only value is non-numeric
        assert_eq!(grid.get(2, 2), Some(&ExportCell::Missing));
        assert_eq!(grid.display(2, 2), "(n/a)");
        // West x B has no rows at all
        assert_eq!(grid.get(3, 2), Some(&ExportCell::Blank));
        assert_eq!(grid.get(4, 3), Some(&ExportCell::Number(15.0)));
    }

    #[test]
    fn test_collapsed_columns_without_subtotals_stay_in_the_grid() {
        let rows = vec![
            Row::new(0).with("region", "East").with("cat", "X").with("sub", "x1").with("sales", 1.0),
            Row::new(1).with("region", "West").with("cat", "Y").with("sub", "y1").with("sales", 2.0),
        ];
        let config = PivotConfig {
            rows: vec![PivotFieldConfig::new("region")],
            columns: vec![PivotFieldConfig::new("cat"), PivotFieldConfig::new("sub")],
            values: vec![ValueFieldConfig::new("sales", AggregationKind::Sum)],
            ..Default::default()
        };
        let result = calculate_pivot(&rows, &config, &PivotOptions::without_totals());

        let mut options = ExportOptions::default();
        options
            .collapse
            .toggle_column(&crate::grouping::child_key(None, "cat", "X"));
        let grid = flatten_to_grid(&result, &options);

        // label column + collapsed X + Y/y1, like a collapsed row keeps its line
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.display(0, 1), "X");
        assert_eq!(grid.display(0, 2), "Y");
        assert_eq!(grid.get(1, 1), Some(&ExportCell::Blank));
        assert_eq!(grid.display(1, 2), "y1");
        // two column levels + measure row, then East, West
        assert_eq!(grid.header_rows, 3);
        assert_eq!(grid.height(), 5);
        assert_eq!(grid.get(3, 1), Some(&ExportCell::Blank));
        assert_eq!(grid.get(4, 1), Some(&ExportCell::Blank));
        assert_eq!(grid.get(4, 2), Some(&ExportCell::Number(2.0)));
    }

    #[test]
    fn test_tsv_rendering() {
        let options = ExportOptions {
            empty_cell_text: "-".to_string(),
            ..Default::default()
        };
        let grid = flatten_to_grid(&sample(), &options);
        let tsv = grid.to_tsv();
        let lines: Vec<&str> = tsv.lines().collect();
        assert_eq!(lines[2], "East\t10\t-\t10");
        assert_eq!(lines[3], "West\t5\t\t5");
    }
}
