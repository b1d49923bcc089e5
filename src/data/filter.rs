//! Pattern filter application.
//! Derives the row subset a pinned pattern refers to.

use crate::pattern::{FilterRule, PatternFilter};
use polars::prelude::*;

/// Apply every filter of a pattern, keeping rows that match all of them.
///
/// Total for well-formed inputs; referencing an unknown column or an
/// impossible cast surfaces as a `PolarsError` for the caller's status
/// handling.
pub fn apply_filter(df: &DataFrame, filters: &[PatternFilter]) -> PolarsResult<DataFrame> {
    let Some(predicate) = combined_predicate(filters) else {
        return Ok(df.clone());
    };
    df.clone().lazy().filter(predicate).collect()
}

fn combined_predicate(filters: &[PatternFilter]) -> Option<Expr> {
    filters
        .iter()
        .map(filter_expr)
        .reduce(|acc, e| acc.and(e))
}

fn filter_expr(filter: &PatternFilter) -> Expr {
    let field = filter.field.as_str();
    match &filter.rule {
        FilterRule::OneOf { values } => values
            .iter()
            .map(|v| col(field).cast(DataType::String).eq(lit(v.as_str())))
            .reduce(|acc, e| acc.or(e))
            // Empty membership set keeps nothing.
            .unwrap_or_else(|| lit(false)),
        FilterRule::Range { min, max } => {
            let value = col(field).cast(DataType::Float64);
            value.clone().gt_eq(lit(*min)).and(value.lt_eq(lit(*max)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternFilter;
    use polars::df;

    fn sample() -> DataFrame {
        df!(
            "city" => ["osaka", "kyoto", "osaka", "nara"],
            "price" => [120.0, 80.0, 60.0, 95.0],
        )
        .unwrap()
    }

    #[test]
    fn empty_filter_list_keeps_all_rows() {
        let df = sample();
        let out = apply_filter(&df, &[]).unwrap();
        assert_eq!(out.height(), 4);
    }

    #[test]
    fn one_of_keeps_matching_rows() {
        let df = sample();
        let filters = vec![PatternFilter::one_of("city", vec!["osaka".into()])];
        let out = apply_filter(&df, &filters).unwrap();
        assert_eq!(out.height(), 2);
    }

    #[test]
    fn one_of_with_no_values_matches_nothing() {
        let df = sample();
        let filters = vec![PatternFilter::one_of("city", vec![])];
        let out = apply_filter(&df, &filters).unwrap();
        assert_eq!(out.height(), 0);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let df = sample();
        let filters = vec![PatternFilter::range("price", 80.0, 120.0)];
        let out = apply_filter(&df, &filters).unwrap();
        assert_eq!(out.height(), 3);
    }

    #[test]
    fn filters_combine_with_and() {
        let df = sample();
        let filters = vec![
            PatternFilter::one_of("city", vec!["osaka".into(), "nara".into()]),
            PatternFilter::range("price", 90.0, 130.0),
        ];
        let out = apply_filter(&df, &filters).unwrap();
        assert_eq!(out.height(), 2); // osaka@120, nara@95
    }

    #[test]
    fn unknown_column_is_an_error() {
        let df = sample();
        let filters = vec![PatternFilter::one_of("no_such", vec!["x".into()])];
        assert!(apply_filter(&df, &filters).is_err());
    }
}
