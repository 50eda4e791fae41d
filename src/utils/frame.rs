//! Column access helpers over polars DataFrames

use crate::error::{AbdmfError, Result};
use polars::prelude::*;

/// Name of the binary outcome column in historical datasets
pub const OUTCOME_COLUMN: &str = "selected";

/// Whether the frame contains a column with this name
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

/// Column names in frame order
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|c| c.to_string())
        .collect()
}

/// Whether the named column holds text values
pub fn is_text_column(df: &DataFrame, name: &str) -> Result<bool> {
    let column = df
        .column(name)
        .map_err(|_| AbdmfError::MissingColumns(vec![name.to_string()]))?;
    Ok(matches!(column.dtype(), DataType::String))
}

/// Read a column as its string representation, keeping nulls
pub fn column_as_strings(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| AbdmfError::MissingColumns(vec![name.to_string()]))?;
    let series = column.as_materialized_series().cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect();
    Ok(values)
}

/// Read a column as f64, keeping nulls. Text that does not parse becomes null.
pub fn column_as_f64(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let column = df
        .column(name)
        .map_err(|_| AbdmfError::MissingColumns(vec![name.to_string()]))?;
    let series = column.as_materialized_series().cast(&DataType::Float64)?;
    let values = series.f64()?.into_iter().collect();
    Ok(values)
}

/// Binary outcomes of the `selected` column: a record counts as selected iff
/// its value equals 1. Nulls count as not selected.
pub fn selected_outcomes(df: &DataFrame) -> Result<Vec<bool>> {
    if !has_column(df, OUTCOME_COLUMN) {
        return Err(AbdmfError::MissingColumns(vec![OUTCOME_COLUMN.to_string()]));
    }
    if is_text_column(df, OUTCOME_COLUMN)? {
        return Err(AbdmfError::InvalidInput(format!(
            "Outcome column '{}' must be numeric or boolean",
            OUTCOME_COLUMN
        )));
    }

    Ok(column_as_f64(df, OUTCOME_COLUMN)?
        .into_iter()
        .map(|v| v.map_or(false, |x| (x - 1.0).abs() < 1e-10))
        .collect())
}

/// Copy of the frame without the named columns. Names not present are ignored.
pub fn drop_columns(df: &DataFrame, names: &[String]) -> Result<DataFrame> {
    let keep: Vec<String> = column_names(df)
        .into_iter()
        .filter(|c| !names.contains(c))
        .collect();
    Ok(df.select(keep)?)
}
