//! FILENAME: core/pivot-engine/src/measures.rs
//! Calculated measures - formulas over the aggregates of one cell.
//!
//! Formulas are parsed once per compute call and evaluated per cell after
//! every value-field aggregate of that cell is known. Evaluation never
//! touches raw rows. Any failure (parse error, unresolved or null reference,
//! division by zero, non-finite result) makes that measure `None` in that
//! cell and nothing else.
//!
//! Reference resolution order:
//! 1. an exact measure key already in the cell ("Sum of sales")
//! 2. a calculated measure evaluated earlier for the same cell
//! 3. a value field's source field name ("sales" -> first "<Agg> of sales")

use measure_parser::{parse, BinaryOperator, Expression, ParseError, UnaryOperator};

use crate::definition::{CalculatedMeasure, ValueFieldConfig};
use crate::result::PivotDataCell;

struct CompiledMeasure {
    name: String,
    formula: Result<Expression, ParseError>,
}

/// The calculated measures of one compute call, parsed once.
#[derive(Default)]
pub struct CompiledMeasures {
    measures: Vec<CompiledMeasure>,
}

impl CompiledMeasures {
    pub fn compile(measures: &[CalculatedMeasure]) -> Self {
        let measures = measures
            .iter()
            .map(|m| {
                let formula = parse(&m.formula);
                if let Err(e) = &formula {
                    crate::log_warn!("MEASURE", "'{}' will be null: {}", m.name, e);
                }
                CompiledMeasure {
                    name: m.name.clone(),
                    formula,
                }
            })
            .collect();
        CompiledMeasures { measures }
    }

    pub fn is_empty(&self) -> bool {
        self.measures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.measures.len()
    }

    /// Evaluates every measure in order and stores the results in `cell`.
    pub fn evaluate_into(&self, cell: &mut PivotDataCell, value_fields: &[ValueFieldConfig]) {
        for measure in &self.measures {
            let value = match &measure.formula {
                Ok(expr) => evaluate(expr, &|name: &str| resolve(name, cell, value_fields)),
                Err(_) => None,
            };
            cell.insert(measure.name.clone(), value);
        }
    }
}

fn resolve(name: &str, cell: &PivotDataCell, value_fields: &[ValueFieldConfig]) -> Option<f64> {
    if cell.contains(name) {
        return cell.value(name);
    }
    value_fields
        .iter()
        .find(|vf| vf.field == name)
        .and_then(|vf| cell.value(&vf.measure_key()))
}

/// Folds an expression to a finite number, or `None`.
pub fn evaluate(expr: &Expression, lookup: &dyn Fn(&str) -> Option<f64>) -> Option<f64> {
    let value = match expr {
        Expression::Number(n) => *n,
        Expression::Reference(name) => lookup(name)?,
        Expression::UnaryOp { op, operand } => {
            let v = evaluate(operand, lookup)?;
            match op {
                UnaryOperator::Negate => -v,
                UnaryOperator::Plus => v,
            }
        }
        Expression::BinaryOp { left, op, right } => {
            let l = evaluate(left, lookup)?;
            let r = evaluate(right, lookup)?;
            match op {
                BinaryOperator::Add => l + r,
                BinaryOperator::Subtract => l - r,
                BinaryOperator::Multiply => l * r,
                BinaryOperator::Divide => {
                    if r == 0.0 {
                        return None;
                    }
                    l / r
                }
                BinaryOperator::Power => l.powf(r),
            }
        }
    };
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::AggregationKind;

    fn cell(values: &[(&str, Option<f64>)]) -> PivotDataCell {
        let mut cell = PivotDataCell::new();
        for (k, v) in values {
            cell.insert(*k, *v);
        }
        cell
    }

    fn value_fields() -> Vec<ValueFieldConfig> {
        vec![
            ValueFieldConfig::new("sales", AggregationKind::Sum),
            ValueFieldConfig::new("cost", AggregationKind::Sum),
        ]
    }

    fn run(formulas: &[(&str, &str)], mut target: PivotDataCell) -> PivotDataCell {
        let defs: Vec<CalculatedMeasure> = formulas
            .iter()
            .enumerate()
            .map(|(i, (name, formula))| CalculatedMeasure::new(format!("m{}", i), *name, *formula))
            .collect();
        CompiledMeasures::compile(&defs).evaluate_into(&mut target, &value_fields());
        target
    }

    #[test]
    fn test_field_name_resolves_to_its_aggregate() {
        let out = run(
            &[("margin", "sales - cost")],
            cell(&[("Sum of sales", Some(30.0)), ("Sum of cost", Some(12.0))]),
        );
        assert_eq!(out.value("margin"), Some(18.0));
    }

    #[test]
    fn test_exact_measure_key_and_earlier_measure() {
        let out = run(
            &[
                ("margin", "[Sum of sales] - [Sum of cost]"),
                ("margin pct", "margin / \"Sum of sales\""),
            ],
            cell(&[("Sum of sales", Some(40.0)), ("Sum of cost", Some(10.0))]),
        );
        assert_eq!(out.value("margin pct"), Some(0.75));
    }

    #[test]
    fn test_later_measure_is_not_visible() {
        let out = run(
            &[("a", "b + 1"), ("b", "2")],
            cell(&[("Sum of sales", Some(1.0))]),
        );
        assert!(out.contains("a"));
        assert_eq!(out.value("a"), None);
        assert_eq!(out.value("b"), Some(2.0));
    }

    #[test]
    fn test_null_reference_yields_null() {
        let out = run(
            &[("margin", "sales - cost")],
            cell(&[("Sum of sales", Some(10.0)), ("Sum of cost", None)]),
        );
        assert!(out.contains("margin"));
        assert_eq!(out.value("margin"), None);
    }

    #[test]
    fn test_arithmetic_failures_yield_null() {
        let out = run(
            &[("div", "sales / 0"), ("huge", "10 ^ 400"), ("root", "(0 - 1) ^ 0.5")],
            cell(&[("Sum of sales", Some(10.0))]),
        );
        assert_eq!(out.value("div"), None);
        assert_eq!(out.value("huge"), None);
        assert_eq!(out.value("root"), None);
    }

    #[test]
    fn test_bad_formula_only_nulls_its_own_measure() {
        let out = run(
            &[("bad", "SUM(sales)"), ("good", "sales * 2")],
            cell(&[("Sum of sales", Some(5.0))]),
        );
        assert_eq!(out.value("bad"), None);
        assert_eq!(out.value("good"), Some(10.0));
        assert_eq!(out.value("Sum of sales"), Some(5.0));
    }

    #[test]
    fn test_self_reference_is_null() {
        let out = run(&[("loop", "loop + 1")], cell(&[]));
        assert_eq!(out.value("loop"), None);
    }

    #[test]
    fn test_evaluate_precedence() {
        let expr = parse("=-2 ^ 2 + 3 * 2").unwrap();
        assert_eq!(evaluate(&expr, &|_: &str| None), Some(2.0));
    }
}
