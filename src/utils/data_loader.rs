//! Data loading utilities

use crate::error::{AbdmfError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Loader for historical decision datasets and candidate files
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Rows used for schema inference on CSV input
    infer_schema_length: usize,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: 1000,
        }
    }

    /// Set the number of rows used for CSV schema inference
    pub fn with_infer_schema_length(mut self, rows: usize) -> Self {
        self.infer_schema_length = rows.max(1);
        self
    }

    /// Load a CSV file with a header row
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        self.load_delimited(path.as_ref(), b',')
    }

    fn load_delimited(&self, path: &Path, delimiter: u8) -> Result<DataFrame> {
        let file = File::open(path)?;

        let parse_opts = CsvParseOptions::default().with_separator(delimiter);

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(self.infer_schema_length))
            .with_parse_options(parse_opts)
            .into_reader_with_file_handle(file)
            .finish()?;

        Ok(df)
    }

    /// Load a JSON file (array of records)
    pub fn load_json(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let file = File::open(path.as_ref())?;
        Ok(JsonReader::new(file).finish()?)
    }

    /// Load a Parquet file
    pub fn load_parquet(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let file = File::open(path.as_ref())?;
        Ok(ParquetReader::new(file).finish()?)
    }

    /// Detect file format from extension and load
    pub fn load_auto(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        let df = match ext.as_str() {
            "csv" => self.load_delimited(path, b',')?,
            "tsv" => self.load_delimited(path, b'\t')?,
            "json" => self.load_json(path)?,
            "parquet" | "pq" => self.load_parquet(path)?,
            other => {
                return Err(AbdmfError::InvalidInput(format!(
                    "Unsupported file format: '{}' ({})",
                    other,
                    path.display()
                )))
            }
        };

        debug!(path = %path.display(), rows = df.height(), cols = df.width(), "Loaded dataset");
        Ok(df)
    }
}

/// Save DataFrames to disk
pub struct DataSaver;

impl DataSaver {
    /// Save to CSV
    pub fn save_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path.as_ref())?;
        CsvWriter::new(&mut file).finish(df)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv() -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".csv")
            .tempfile()
            .unwrap();
        writeln!(file, "gender,experience,selected").unwrap();
        writeln!(file, "M,5,1").unwrap();
        writeln!(file, "F,12,0").unwrap();
        writeln!(file, "F,3,1").unwrap();
        file
    }

    #[test]
    fn test_load_csv() {
        let file = create_test_csv();
        let loader = DataLoader::new();

        let df = loader.load_csv(file.path()).unwrap();

        assert_eq!(df.height(), 3);
        assert_eq!(df.width(), 3);
    }

    #[test]
    fn test_load_auto_detects_csv() {
        let file = create_test_csv();
        let df = DataLoader::new().load_auto(file.path()).unwrap();
        assert_eq!(df.height(), 3);
    }

    #[test]
    fn test_load_auto_rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        let result = DataLoader::new().load_auto(file.path());
        assert!(matches!(result, Err(AbdmfError::InvalidInput(_))));
    }

    #[test]
    fn test_save_csv_roundtrip() {
        let mut df = DataFrame::new(vec![
            Column::new("a".into(), &[1i64, 2, 3]),
            Column::new("b".into(), &[4i64, 5, 6]),
        ])
        .unwrap();

        let file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        DataSaver::save_csv(&mut df, file.path()).unwrap();

        let loaded = DataLoader::new().load_csv(file.path()).unwrap();
        assert_eq!(loaded.height(), 3);
        assert_eq!(loaded.width(), 2);
    }
}
