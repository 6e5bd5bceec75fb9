use std::path::PathBuf;

use thiserror::Error;
use vaxstat_core::CoreError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("no linelist_cases*.csv files in {0}")]
    NoLinelistFiles(PathBuf),

    #[error("{file}: missing column {column}")]
    MissingColumn { file: PathBuf, column: String },

    #[error("{file}: column {column} is not {expected}")]
    ColumnType {
        file: PathBuf,
        column: String,
        expected: &'static str,
    },

    #[error("{file}: null {column} at row {row}")]
    NullValue {
        file: PathBuf,
        column: String,
        row: usize,
    },

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] CoreError),
}
