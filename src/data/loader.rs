//! CSV Data Loader Module
//! Handles CSV file loading and column inspection using Polars.

use crate::pattern::SemanticType;
use polars::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("CSV contained no columns")]
    EmptySchema,
}

/// Load a CSV file using Polars.
pub fn load_csv(file_path: &str) -> Result<DataFrame, LoaderError> {
    // Use lazy evaluation for memory efficiency, then collect
    let df = LazyCsvReader::new(file_path)
        .with_infer_schema_length(Some(10000))
        .with_ignore_errors(true)
        .finish()?
        .collect()?;

    if df.width() == 0 {
        return Err(LoaderError::EmptySchema);
    }
    Ok(df)
}

/// Column names paired with their inferred semantic types.
pub fn columns_with_semantics(df: &DataFrame) -> Vec<(String, SemanticType)> {
    df.get_columns()
        .iter()
        .map(|col| (col.name().to_string(), semantic_of_dtype(col.dtype())))
        .collect()
}

pub fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Map a physical dtype onto the semantic role the spec builders reason about.
pub fn semantic_of_dtype(dtype: &DataType) -> SemanticType {
    if is_numeric(dtype) {
        SemanticType::Quantitative
    } else {
        match dtype {
            DataType::Date | DataType::Datetime(_, _) | DataType::Time => SemanticType::Temporal,
            _ => SemanticType::Nominal,
        }
    }
}

/// Unique non-null values of a column, stringified.
pub fn unique_values(df: &DataFrame, column: &str) -> Vec<String> {
    df.column(column)
        .ok()
        .and_then(|col| col.unique().ok())
        .map(|unique| {
            let series = unique.as_materialized_series();
            let mut values: Vec<String> = (0..series.len())
                .filter_map(|i| {
                    let val = series.get(i).ok()?;
                    if val.is_null() {
                        None
                    } else {
                        Some(val.to_string().trim_matches('"').to_string())
                    }
                })
                .collect();
            values.sort();
            values
        })
        .unwrap_or_default()
}
