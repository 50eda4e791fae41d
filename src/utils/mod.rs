//! Utility functions and types

pub mod data_loader;
pub mod frame;

pub use data_loader::{DataLoader, DataSaver};
pub use frame::OUTCOME_COLUMN;

use crate::error::{AbdmfError, Result};
use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;

/// Check that every required column is present, reporting all missing ones.
pub fn validate_data(df: &DataFrame, required_columns: &[&str]) -> Result<()> {
    let missing: Vec<String> = required_columns
        .iter()
        .filter(|c| !frame::has_column(df, c))
        .map(|c| c.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(AbdmfError::MissingColumns(missing))
    }
}

/// Format a timestamp for consistent output
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Escape angle brackets in free text so it can be embedded in HTML reports.
pub fn sanitize_input(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}
