//! Feature encoding from DataFrames to numeric matrices

use crate::error::{AbdmfError, Result};
use crate::utils::frame;
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Code assigned to nulls and categories not seen during fit
pub const UNKNOWN_CATEGORY: f64 = -1.0;

/// How one column is turned into a number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnEncoding {
    /// Text column: code is the index into the sorted category list
    Categorical { categories: Vec<String> },
    /// Numeric column: nulls replaced by the fitted mean
    Numeric { fill_value: f64 },
}

/// A fitted column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedColumn {
    pub name: String,
    pub encoding: ColumnEncoding,
}

/// Label-encodes text columns and mean-imputes numeric ones.
///
/// The fitted column order is the feature order of the produced matrix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    columns: Vec<EncodedColumn>,
}

impl FeatureEncoder {
    /// Create an unfitted encoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn category lists and fill values from every column of `df`
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        let mut columns = Vec::with_capacity(df.width());

        for name in frame::column_names(df) {
            let encoding = if frame::is_text_column(df, &name)? {
                let mut categories: Vec<String> = frame::column_as_strings(df, &name)?
                    .into_iter()
                    .flatten()
                    .collect();
                categories.sort();
                categories.dedup();
                ColumnEncoding::Categorical { categories }
            } else {
                let values: Vec<f64> = frame::column_as_f64(df, &name)?
                    .into_iter()
                    .flatten()
                    .filter(|v| v.is_finite())
                    .collect();
                let fill_value = if values.is_empty() {
                    0.0
                } else {
                    values.iter().sum::<f64>() / values.len() as f64
                };
                ColumnEncoding::Numeric { fill_value }
            };

            debug!(column = %name, ?encoding, "Fitted column encoding");
            columns.push(EncodedColumn { name, encoding });
        }

        self.columns = columns;
        Ok(self)
    }

    /// Encode the fitted columns of `df` into a row-major matrix.
    ///
    /// Extra columns are ignored; fitted columns that are absent are reported
    /// together as `MissingFeatures`.
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let missing: Vec<String> = self
            .columns
            .iter()
            .filter(|c| !frame::has_column(df, &c.name))
            .map(|c| c.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(AbdmfError::MissingFeatures(missing));
        }

        let mut matrix = Array2::zeros((df.height(), self.columns.len()));

        for (j, column) in self.columns.iter().enumerate() {
            let encoded: Vec<f64> = match &column.encoding {
                ColumnEncoding::Categorical { categories } => {
                    frame::column_as_strings(df, &column.name)?
                        .into_iter()
                        .map(|value| {
                            value
                                .and_then(|v| categories.binary_search(&v).ok())
                                .map_or(UNKNOWN_CATEGORY, |code| code as f64)
                        })
                        .collect()
                }
                ColumnEncoding::Numeric { fill_value } => frame::column_as_f64(df, &column.name)?
                    .into_iter()
                    .map(|value| match value {
                        Some(v) if v.is_finite() => v,
                        _ => *fill_value,
                    })
                    .collect(),
            };

            for (i, v) in encoded.into_iter().enumerate() {
                matrix[[i, j]] = v;
            }
        }

        Ok(matrix)
    }

    /// Fit on `df` and encode it
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<Array2<f64>> {
        self.fit(df)?;
        self.transform(df)
    }

    /// Fitted column names, in matrix order
    pub fn feature_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Fitted columns
    pub fn columns(&self) -> &[EncodedColumn] {
        &self.columns
    }

    /// Whether `fit` has seen at least one column
    pub fn is_fitted(&self) -> bool {
        !self.columns.is_empty()
    }
}
