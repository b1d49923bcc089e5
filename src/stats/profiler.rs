//! Field Profiler Module
//! Descriptive statistics per field, feeding the rich spec builder.

use crate::data::loader;
use crate::pattern::PatternField;
use polars::prelude::*;
use rayon::prelude::*;
use statrs::statistics::{Data, OrderStatistics, Statistics};
use std::collections::HashMap;

/// Summary of a numeric column.
#[derive(Debug, Clone)]
pub struct NumericProfile {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub median: f64,
    pub skewness: f64,
}

/// Profile of one field of the dataset.
#[derive(Debug, Clone)]
pub struct FieldProfile {
    pub field: String,
    pub count: usize,
    pub distinct: usize,
    pub numeric: Option<NumericProfile>,
}

impl FieldProfile {
    /// Heavily one-sided positive distributions read better on a log axis.
    pub fn wants_log_scale(&self) -> bool {
        self.numeric
            .as_ref()
            .is_some_and(|n| n.skewness.abs() > 2.0 && n.min > 0.0)
    }
}

/// Profile the given pattern fields in parallel.
pub fn profile_fields(df: &DataFrame, fields: &[PatternField]) -> HashMap<String, FieldProfile> {
    fields
        .par_iter()
        .filter_map(|f| profile_field(df, &f.name).map(|p| (f.name.clone(), p)))
        .collect()
}

/// Profile a single column. Returns `None` for unknown columns.
pub fn profile_field(df: &DataFrame, name: &str) -> Option<FieldProfile> {
    let column = df.column(name).ok()?;
    let series = column.as_materialized_series();
    let count = series.len() - series.null_count();
    let distinct = series.n_unique().unwrap_or(0);

    let numeric = if loader::is_numeric(series.dtype()) {
        numeric_profile(column)
    } else {
        None
    };

    Some(FieldProfile {
        field: name.to_string(),
        count,
        distinct,
        numeric,
    })
}

fn numeric_profile(column: &Column) -> Option<NumericProfile> {
    let values: Vec<f64> = column
        .cast(&DataType::Float64)
        .ok()?
        .f64()
        .ok()?
        .into_iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .collect();
    if values.is_empty() {
        return None;
    }

    let mean = values.iter().mean();
    let std_dev = if values.len() > 1 {
        values.iter().std_dev()
    } else {
        0.0
    };
    let median = Data::new(values.clone()).median();

    Some(NumericProfile {
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        mean,
        std_dev,
        median,
        skewness: skewness(&values, mean, std_dev),
    })
}

/// Adjusted Fisher-Pearson standardized moment coefficient.
fn skewness(values: &[f64], mean: f64, std_dev: f64) -> f64 {
    let n = values.len();
    if n < 3 || std_dev == 0.0 {
        return 0.0;
    }
    let nf = n as f64;
    let m3 = values
        .iter()
        .map(|v| ((v - mean) / std_dev).powi(3))
        .sum::<f64>();
    m3 * nf / ((nf - 1.0) * (nf - 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{PatternField, SemanticType};
    use polars::df;

    #[test]
    fn profiles_numeric_column() {
        let df = df!("v" => [1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let p = profile_field(&df, "v").unwrap();
        assert_eq!(p.count, 5);
        assert_eq!(p.distinct, 5);
        let n = p.numeric.unwrap();
        assert!((n.mean - 3.0).abs() < 1e-9);
        assert!((n.median - 3.0).abs() < 1e-9);
        assert!((n.min - 1.0).abs() < 1e-9);
        assert!((n.max - 5.0).abs() < 1e-9);
        assert!(n.skewness.abs() < 1e-9);
    }

    #[test]
    fn categorical_column_has_no_numeric_profile() {
        let df = df!("c" => ["a", "b", "a"]).unwrap();
        let p = profile_field(&df, "c").unwrap();
        assert_eq!(p.distinct, 2);
        assert!(p.numeric.is_none());
    }

    #[test]
    fn long_right_tail_wants_log_scale() {
        let mut values = vec![1.0; 40];
        values.extend([2.0, 3.0, 5.0, 2000.0, 5000.0]);
        let df = df!("v" => values).unwrap();
        let p = profile_field(&df, "v").unwrap();
        assert!(p.numeric.as_ref().unwrap().skewness > 2.0);
        assert!(p.wants_log_scale());
    }

    #[test]
    fn symmetric_data_does_not_want_log_scale() {
        let df = df!("v" => [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let p = profile_field(&df, "v").unwrap();
        assert!(!p.wants_log_scale());
    }

    #[test]
    fn unknown_fields_are_skipped_in_bulk_profile() {
        let df = df!("v" => [1.0, 2.0]).unwrap();
        let fields = vec![
            PatternField::new("v", SemanticType::Quantitative),
            PatternField::new("ghost", SemanticType::Nominal),
        ];
        let profiles = profile_fields(&df, &fields);
        assert_eq!(profiles.len(), 1);
        assert!(profiles.contains_key("v"));
    }
}
