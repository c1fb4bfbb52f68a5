//! What an export run produced

use export_core::{ExportFormat, ExportWarning, WrittenFile};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus {
    Completed,
    /// Stopped on request; tables finished before the stop keep their files
    Cancelled,
}

/// One table that made it through normalization (and, in separate mode, to disk)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub name: String,
    pub row_count: usize,
    pub file: Option<WrittenFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportReport {
    pub status: ExportStatus,
    pub database: String,
    pub exported_at: String,
    pub format: ExportFormat,
    pub output_dir: PathBuf,
    pub tables: Vec<TableSummary>,
    /// Combined document or summary document; absent when cancelled
    pub output_file: Option<WrittenFile>,
    pub warnings: Vec<ExportWarning>,
}

impl ExportReport {
    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.row_count).sum()
    }

    pub fn completed_tables(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.clone()).collect()
    }

    /// Every file written, in write order.
    pub fn written_files(&self) -> Vec<WrittenFile> {
        self.tables
            .iter()
            .filter_map(|t| t.file.clone())
            .chain(self.output_file.clone())
            .collect()
    }

    pub fn total_bytes(&self) -> u64 {
        self.written_files().iter().map(|f| f.bytes).sum()
    }
}

/// A run that stopped on an error, with the tables completed before it
#[derive(Debug, thiserror::Error)]
#[error("{error:#}")]
pub struct ExportFailure {
    pub error: anyhow::Error,
    pub completed: Vec<TableSummary>,
}
