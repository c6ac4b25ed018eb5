//! FILENAME: core/pivot-engine/src/validation.rs
//! Config validation for the configuration editor.
//!
//! The engine never calls this; it degrades per cell instead. Editors run it
//! before computing so users see problems as messages rather than nulls.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::definition::PivotConfig;
use crate::error::{ConfigArea, ConfigError};

/// Checks a config against the dataset's headers. Collects every problem.
pub fn validate_config<S: AsRef<str>>(
    config: &PivotConfig,
    headers: &[S],
) -> Result<(), Vec<ConfigError>> {
    let headers: FxHashSet<&str> = headers.iter().map(AsRef::as_ref).collect();
    let mut errors = Vec::new();

    let areas: [(ConfigArea, Vec<&str>); 4] = [
        (ConfigArea::Rows, config.rows.iter().map(|f| f.field.as_str()).collect()),
        (ConfigArea::Columns, config.columns.iter().map(|f| f.field.as_str()).collect()),
        (ConfigArea::Values, config.values.iter().map(|f| f.field.as_str()).collect()),
        (ConfigArea::Filters, config.filters.iter().map(|f| f.field.as_str()).collect()),
    ];

    for (area, fields) in &areas {
        let mut seen = FxHashSet::default();
        for field in fields {
            if !headers.contains(field) {
                errors.push(ConfigError::UnknownField {
                    area: *area,
                    field: field.to_string(),
                });
            }
            if *area != ConfigArea::Filters && !seen.insert(*field) {
                errors.push(ConfigError::DuplicateField {
                    area: *area,
                    field: field.to_string(),
                });
            }
        }
    }

    // Rows, columns and values share one field namespace; filters may reuse any field.
    let mut first_area: FxHashMap<&str, ConfigArea> = FxHashMap::default();
    let mut reported: FxHashSet<(&str, ConfigArea)> = FxHashSet::default();
    for (area, fields) in areas.iter().filter(|(area, _)| *area != ConfigArea::Filters) {
        for field in fields {
            let first = *first_area.entry(*field).or_insert(*area);
            if first != *area && reported.insert((*field, *area)) {
                errors.push(ConfigError::FieldInSeveralAreas {
                    field: field.to_string(),
                    first,
                    second: *area,
                });
            }
        }
    }

    validate_measures(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_measures(config: &PivotConfig, errors: &mut Vec<ConfigError>) {
    let value_keys = config.value_measure_keys();
    let value_fields: FxHashSet<&str> = config.values.iter().map(|v| v.field.as_str()).collect();
    let mut earlier: FxHashSet<&str> = FxHashSet::default();

    for measure in &config.calculated_measures {
        let name = measure.name.as_str();
        if value_keys.iter().any(|k| k == name) {
            errors.push(ConfigError::MeasureNameCollision {
                name: name.to_string(),
            });
        } else if earlier.contains(name) {
            errors.push(ConfigError::DuplicateMeasureName {
                name: name.to_string(),
            });
        }

        match measure_parser::parse(&measure.formula) {
            Err(e) => errors.push(ConfigError::InvalidFormula {
                name: name.to_string(),
                message: e.message,
            }),
            Ok(expr) => {
                for reference in expr.references() {
                    let known = value_keys.iter().any(|k| k == reference)
                        || earlier.contains(reference)
                        || value_fields.contains(reference);
                    if !known {
                        errors.push(ConfigError::UnknownReference {
                            name: name.to_string(),
                            reference: reference.to_string(),
                        });
                    }
                }
            }
        }

        earlier.insert(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{
        AggregationKind, CalculatedMeasure, FilterConfig, PivotFieldConfig, ValueFieldConfig,
    };

    const HEADERS: [&str; 4] = ["region", "cat", "sales", "cost"];

    fn base() -> PivotConfig {
        PivotConfig {
            rows: vec![PivotFieldConfig::new("region")],
            columns: vec![PivotFieldConfig::new("cat")],
            values: vec![
                ValueFieldConfig::new("sales", AggregationKind::Sum),
                ValueFieldConfig::new("cost", AggregationKind::Sum),
            ],
            filters: vec![FilterConfig::new("region", ["East"])],
            calculated_measures: vec![CalculatedMeasure::new("m1", "margin", "sales - cost")],
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert_eq!(validate_config(&base(), &HEADERS), Ok(()));
    }

    #[test]
    fn test_duplicates_and_cross_area_use() {
        let mut config = base();
        config.rows.push(PivotFieldConfig::new("region"));
        config.columns.push(PivotFieldConfig::new("region"));
        let errors = validate_config(&config, &HEADERS).unwrap_err();
        assert!(errors.contains(&ConfigError::DuplicateField {
            area: ConfigArea::Rows,
            field: "region".to_string(),
        }));
        assert!(errors.contains(&ConfigError::FieldInSeveralAreas {
            field: "region".to_string(),
            first: ConfigArea::Rows,
            second: ConfigArea::Columns,
        }));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_grouping_field_may_not_also_be_a_value() {
        let mut config = base();
        config.values.push(ValueFieldConfig::new("region", AggregationKind::UniqueCount));
        config.values.push(ValueFieldConfig::new("cat", AggregationKind::Count));
        let errors = validate_config(&config, &HEADERS).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ConfigError::FieldInSeveralAreas {
                    field: "region".to_string(),
                    first: ConfigArea::Rows,
                    second: ConfigArea::Values,
                },
                ConfigError::FieldInSeveralAreas {
                    field: "cat".to_string(),
                    first: ConfigArea::Columns,
                    second: ConfigArea::Values,
                },
            ]
        );
        assert_eq!(
            errors[0].to_string(),
            "field 'region' is used in both rows and values"
        );
    }

    #[test]
    fn test_filter_may_reuse_a_grouping_field() {
        let mut config = base();
        config.filters.push(FilterConfig::new("cat", ["A"]));
        assert_eq!(validate_config(&config, &HEADERS), Ok(()));
    }

    #[test]
    fn test_unknown_fields_in_any_area() {
        let mut config = base();
        config.filters.push(FilterConfig::new("channel", ["web"]));
        config.values.push(ValueFieldConfig::new("qty", AggregationKind::Sum));
        let errors = validate_config(&config, &HEADERS).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.to_string() == "unknown field 'channel' in filters"));
        assert!(errors.iter().any(|e| e.to_string() == "unknown field 'qty' in values"));
    }

    #[test]
    fn test_measure_name_rules() {
        let mut config = base();
        config
            .calculated_measures
            .push(CalculatedMeasure::new("m2", "margin", "sales"));
        config
            .calculated_measures
            .push(CalculatedMeasure::new("m3", "Sum of sales", "sales"));
        let errors = validate_config(&config, &HEADERS).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ConfigError::DuplicateMeasureName {
                    name: "margin".to_string()
                },
                ConfigError::MeasureNameCollision {
                    name: "Sum of sales".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_formula_problems() {
        let mut config = base();
        config.calculated_measures = vec![
            CalculatedMeasure::new("m1", "bad", "sales +"),
            CalculatedMeasure::new("m2", "ghost", "profit * 2"),
            CalculatedMeasure::new("m3", "chained", "[Sum of cost] / ghost"),
        ];
        let errors = validate_config(&config, &HEADERS).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(matches!(&errors[0], ConfigError::InvalidFormula { name, .. } if name == "bad"));
        assert_eq!(
            errors[1],
            ConfigError::UnknownReference {
                name: "ghost".to_string(),
                reference: "profit".to_string(),
            }
        );
    }
}
