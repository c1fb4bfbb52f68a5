//! JSON document shapes written to disk.

use crate::normalize::{ExportWarning, NormalizedRow};
use indexmap::IndexMap;
use serde::Serialize;
use std::path::PathBuf;

/// A fully normalized table, not yet tied to an output format.
#[derive(Debug, Clone, PartialEq)]
pub struct TableExport {
    pub table_name: String,
    pub columns: Vec<String>,
    pub data: Vec<NormalizedRow>,
    pub warnings: Vec<ExportWarning>,
}

impl TableExport {
    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    /// Entry in the combined document's `tables` map.
    pub fn into_entry(self) -> TableEntry {
        TableEntry {
            columns: self.columns,
            row_count: self.data.len(),
            data: self.data,
        }
    }

    /// Standalone per-table document (separate-files mode).
    pub fn into_document(self, database: &str, exported_at: &str) -> TableDocument {
        TableDocument {
            table_name: self.table_name,
            database: database.to_string(),
            exported_at: exported_at.to_string(),
            columns: self.columns,
            row_count: self.data.len(),
            data: self.data,
        }
    }
}

/// One table inside a [`CombinedDocument`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableEntry {
    pub columns: Vec<String>,
    pub row_count: usize,
    pub data: Vec<NormalizedRow>,
}

/// `<database>_<table>.json`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDocument {
    pub table_name: String,
    pub database: String,
    pub exported_at: String,
    pub columns: Vec<String>,
    pub row_count: usize,
    pub data: Vec<NormalizedRow>,
}

/// `<database>_database.json`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CombinedDocument {
    pub database: String,
    pub exported_at: String,
    pub table_count: usize,
    pub tables: IndexMap<String, TableEntry>,
}

/// `<database>_export_summary.json`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryDocument {
    pub database: String,
    pub exported_at: String,
    pub total_tables_in_db: usize,
    pub selected_tables_count: usize,
    pub export_format: String,
    pub output_location: PathBuf,
    pub exported_files: Vec<PathBuf>,
    pub table_list: Vec<String>,
}

/// The document written at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FinalDocument {
    Combined(CombinedDocument),
    Summary(SummaryDocument),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> TableExport {
        let mut row = NormalizedRow::new();
        row.insert("id".into(), json!(1));
        TableExport {
            table_name: "users".into(),
            columns: vec!["id".into()],
            data: vec![row],
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_table_document_shape() {
        let doc = sample().into_document("shop", "2024-03-01T10:00:00");
        assert_eq!(
            serde_json::to_value(&doc).unwrap(),
            json!({
                "table_name": "users",
                "database": "shop",
                "exported_at": "2024-03-01T10:00:00",
                "columns": ["id"],
                "row_count": 1,
                "data": [{"id": 1}]
            })
        );
    }

    #[test]
    fn test_entry_row_count_matches_data() {
        let entry = sample().into_entry();
        assert_eq!(entry.row_count, entry.data.len());
    }

    #[test]
    fn test_final_document_serializes_untagged() {
        let summary = SummaryDocument {
            database: "shop".into(),
            exported_at: "t".into(),
            total_tables_in_db: 3,
            selected_tables_count: 1,
            export_format: "separate_files".into(),
            output_location: PathBuf::from("out"),
            exported_files: vec![PathBuf::from("out/shop_users.json")],
            table_list: vec!["users".into()],
        };
        let value = serde_json::to_value(FinalDocument::Summary(summary)).unwrap();
        assert_eq!(value["total_tables_in_db"], 3);
        assert_eq!(value["exported_files"], json!(["out/shop_users.json"]));
    }
}
