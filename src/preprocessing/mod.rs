//! Data preprocessing module
//!
//! Turns candidate and historical DataFrames into numeric feature matrices:
//! - Categorical (text) columns become sorted-category integer codes
//! - Numeric columns are cast to f64 with missing values mean-imputed

mod encoder;

pub use encoder::{ColumnEncoding, EncodedColumn, FeatureEncoder, UNKNOWN_CATEGORY};

use crate::error::Result;
use ndarray::Array2;
use polars::prelude::DataFrame;

/// Encode every column of `df` with an encoder fitted on `df` itself.
pub fn preprocess_features(df: &DataFrame) -> Result<Array2<f64>> {
    FeatureEncoder::new().fit_transform(df)
}
