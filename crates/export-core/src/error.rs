//! Error types for the export core.

use std::path::PathBuf;
use thiserror::Error;

/// A raw row whose length does not match the column list.
///
/// This means the schema and the row fetch are out of sync; it is never
/// patched up by padding or truncating.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("row has {actual} values but the table has {expected} columns")]
pub struct RowShapeError {
    pub expected: usize,
    pub actual: usize,
}

/// Error during an export run.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Column mismatch in table '{table}' at row {row}: {source}")]
    ColumnMismatch {
        table: String,
        row: usize,
        #[source]
        source: RowShapeError,
    },

    #[error("Export cancelled")]
    Cancelled,

    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize {}: {source}", .path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Output directory does not exist or is not a directory: {}", .0.display())]
    InvalidOutputDir(PathBuf),
}
