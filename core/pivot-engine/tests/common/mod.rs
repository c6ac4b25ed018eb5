//! FILENAME: tests/common/mod.rs
//! Fixtures and helpers for pivot engine integration tests.

#![allow(dead_code)]

use pivot_engine::{HeaderNode, PivotResult, Row};

/// Sales data: (region, product, quarter, sales, quantity).
pub struct SalesFixture;

impl SalesFixture {
    pub fn headers() -> Vec<&'static str> {
        vec!["Region", "Product", "Quarter", "Sales", "Quantity"]
    }

    pub fn data() -> Vec<(&'static str, &'static str, &'static str, f64, f64)> {
        vec![
            ("North", "Widget", "Q1", 10000.0, 100.0),
            ("North", "Widget", "Q2", 12000.0, 120.0),
            ("North", "Gadget", "Q1", 8000.0, 80.0),
            ("North", "Gadget", "Q2", 9000.0, 90.0),
            ("South", "Widget", "Q1", 15000.0, 150.0),
            ("South", "Widget", "Q2", 14000.0, 140.0),
            ("South", "Gadget", "Q1", 11000.0, 110.0),
            ("South", "Gadget", "Q2", 13000.0, 130.0),
            ("East", "Widget", "Q1", 9000.0, 90.0),
            ("East", "Widget", "Q2", 11000.0, 110.0),
            ("East", "Gadget", "Q1", 7000.0, 70.0),
            ("East", "Gadget", "Q2", 8500.0, 85.0),
        ]
    }

    pub fn rows() -> Vec<Row> {
        Self::data()
            .into_iter()
            .enumerate()
            .map(|(i, (region, product, quarter, sales, quantity))| {
                Row::new(i as u32)
                    .with("Region", region)
                    .with("Product", product)
                    .with("Quarter", quarter)
                    .with("Sales", sales)
                    .with("Quantity", quantity)
            })
            .collect()
    }

    pub fn sales_for(region: &str) -> Vec<f64> {
        Self::data()
            .into_iter()
            .filter(|(r, ..)| *r == region)
            .map(|(.., sales, _)| sales)
            .collect()
    }
}

/// The three-row region/category set used by the worked examples.
pub fn region_category_rows() -> Vec<Row> {
    vec![
        Row::new(0).with("region", "East").with("cat", "A").with("sales", 10.0),
        Row::new(1).with("region", "East").with("cat", "B").with("sales", 20.0),
        Row::new(2).with("region", "West").with("cat", "A").with("sales", 5.0),
    ]
}

// ============================================================================
// ASSERTION HELPERS
// ============================================================================

pub fn assert_value(result: &PivotResult, row_key: &str, col_key: &str, measure: &str, expected: f64) {
    match result.value(row_key, col_key, measure) {
        Some(n) => assert!(
            (n - expected).abs() < 1e-9,
            "{} at ({:?}, {:?}) expected {} but got {}",
            measure, row_key, col_key, expected, n
        ),
        None => panic!(
            "{} at ({:?}, {:?}) expected {} but got nothing",
            measure, row_key, col_key, expected
        ),
    }
}

/// Group nodes (no subtotals, no grand totals) that have no group children.
pub fn group_leaves(nodes: &[HeaderNode]) -> Vec<&HeaderNode> {
    fn walk<'a>(nodes: &'a [HeaderNode], out: &mut Vec<&'a HeaderNode>) {
        for node in nodes {
            if node.is_subtotal || node.is_grand_total {
                continue;
            }
            if node.is_expandable() {
                walk(&node.children, out);
            } else {
                out.push(node);
            }
        }
    }
    let mut out = Vec::new();
    walk(nodes, &mut out);
    out
}
