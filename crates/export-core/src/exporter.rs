//! Table and database exporters.
//!
//! [`export_table`] normalizes every row of one table, in order. The
//! [`DatabaseExporter`] collects table exports for one run under a single
//! timestamp and produces the final combined or summary document. It can be
//! fed one table at a time so that per-table files get written as soon as each
//! table is done.

use crate::document::{
    CombinedDocument, FinalDocument, SummaryDocument, TableDocument, TableEntry, TableExport,
};
use crate::error::ExportError;
use crate::normalize::{normalize_tracked, ExportWarning};
use crate::progress::{ExportControl, ProgressEvent};
use crate::value::{capture_timestamp, RawValue};
use crate::writer::{combined_file_name, summary_file_name, table_file_name};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Tables with more rows than this report row progress.
const ROW_PROGRESS_THRESHOLD: usize = 1000;

/// Row batches per table; cancellation is checked between batches.
const BATCHES_PER_TABLE: usize = 20;

/// Output layout of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// One `<database>_database.json` holding every table
    #[default]
    Combined,
    /// One `<database>_<table>.json` per table plus a summary
    Separate,
}

impl ExportFormat {
    /// Value of the summary's `export_format` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Combined => "single_file",
            Self::Separate => "separate_files",
        }
    }
}

/// What a run exports and where to.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportPlan {
    pub database: String,
    pub format: ExportFormat,
    pub output_dir: PathBuf,
    /// Number of tables in the source database, selected or not
    pub total_tables_in_db: usize,
    pub selected_tables: Vec<String>,
}

/// One table's columns and raw rows, as fetched from the source.
#[derive(Debug, Clone, PartialEq)]
pub struct TableData {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<RawValue>>,
}

/// Normalize every row of a table.
pub fn export_table(
    table_name: &str,
    columns: Vec<String>,
    rows: Vec<Vec<RawValue>>,
) -> Result<TableExport, ExportError> {
    export_table_with(table_name, columns, rows, &ExportControl::default())
}

/// [`export_table`] with row progress and cancellation between row batches.
pub fn export_table_with(
    table_name: &str,
    columns: Vec<String>,
    rows: Vec<Vec<RawValue>>,
    control: &ExportControl,
) -> Result<TableExport, ExportError> {
    let total_rows = rows.len();
    let batch_size = (total_rows / BATCHES_PER_TABLE).max(1);
    let report_rows = total_rows > ROW_PROGRESS_THRESHOLD;

    let mut data = Vec::with_capacity(total_rows);
    let mut fallbacks: IndexMap<(String, String), usize> = IndexMap::new();

    for (row_index, row) in rows.into_iter().enumerate() {
        if row_index % batch_size == 0 {
            if control.is_cancelled() {
                return Err(ExportError::Cancelled);
            }
            if report_rows {
                control.report(ProgressEvent::RowProgress {
                    table: table_name.to_string(),
                    rows_done: row_index,
                    total_rows,
                });
            }
        }

        let normalized = normalize_tracked(&columns, row, |column, source_type| {
            *fallbacks
                .entry((column.to_string(), source_type.to_string()))
                .or_default() += 1;
        })
        .map_err(|source| ExportError::ColumnMismatch {
            table: table_name.to_string(),
            row: row_index,
            source,
        })?;
        data.push(normalized);
    }

    let warnings = fallbacks
        .into_iter()
        .map(|((column, source_type), occurrences)| ExportWarning {
            table: table_name.to_string(),
            column,
            source_type,
            occurrences,
        })
        .collect();

    debug!("Normalized {} rows of table {}", data.len(), table_name);

    Ok(TableExport {
        table_name: table_name.to_string(),
        columns,
        data,
        warnings,
    })
}

/// The last document of a run and where it goes.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalOutput {
    pub path: PathBuf,
    pub document: FinalDocument,
    pub warnings: Vec<ExportWarning>,
}

/// Everything an in-memory [`export_database`] produces.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseExport {
    /// Per-table documents and their paths; empty in combined mode
    pub table_documents: Vec<(PathBuf, TableDocument)>,
    pub output: FinalOutput,
}

/// Assembles one run's documents under a single timestamp.
#[derive(Debug)]
pub struct DatabaseExporter {
    plan: ExportPlan,
    exported_at: String,
    tables: IndexMap<String, TableEntry>,
    exported_files: Vec<PathBuf>,
    warnings: Vec<ExportWarning>,
}

impl DatabaseExporter {
    /// Start a run with a fixed export timestamp.
    pub fn with_timestamp(plan: ExportPlan, exported_at: impl Into<String>) -> Self {
        Self {
            plan,
            exported_at: exported_at.into(),
            tables: IndexMap::new(),
            exported_files: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn exported_at(&self) -> &str {
        &self.exported_at
    }

    pub fn warnings(&self) -> &[ExportWarning] {
        &self.warnings
    }

    /// Add a finished table.
    ///
    /// In separate mode the table's own document is returned with its path
    /// and the caller is expected to write it; the path is listed in the
    /// summary. In combined mode the table is kept for the final document.
    pub fn add_table(&mut self, export: TableExport) -> Option<(PathBuf, TableDocument)> {
        self.warnings.extend(export.warnings.iter().cloned());

        match self.plan.format {
            ExportFormat::Combined => {
                self.tables
                    .insert(export.table_name.clone(), export.into_entry());
                None
            }
            ExportFormat::Separate => {
                let path = self
                    .plan
                    .output_dir
                    .join(table_file_name(&self.plan.database, &export.table_name));
                let document = export.into_document(&self.plan.database, &self.exported_at);
                self.exported_files.push(path.clone());
                Some((path, document))
            }
        }
    }

    /// Build the combined document or the summary document.
    pub fn finish(self) -> FinalOutput {
        let database = self.plan.database;
        match self.plan.format {
            ExportFormat::Combined => FinalOutput {
                path: self.plan.output_dir.join(combined_file_name(&database)),
                document: FinalDocument::Combined(CombinedDocument {
                    table_count: self.tables.len(),
                    database,
                    exported_at: self.exported_at,
                    tables: self.tables,
                }),
                warnings: self.warnings,
            },
            ExportFormat::Separate => FinalOutput {
                path: self.plan.output_dir.join(summary_file_name(&database)),
                document: FinalDocument::Summary(SummaryDocument {
                    database,
                    exported_at: self.exported_at,
                    total_tables_in_db: self.plan.total_tables_in_db,
                    selected_tables_count: self.plan.selected_tables.len(),
                    export_format: self.plan.format.as_str().to_string(),
                    output_location: self.plan.output_dir,
                    exported_files: self.exported_files,
                    table_list: self.plan.selected_tables,
                }),
                warnings: self.warnings,
            },
        }
    }
}

/// Export already fetched tables, capturing the timestamp now.
pub fn export_database(
    plan: ExportPlan,
    tables: Vec<TableData>,
) -> Result<DatabaseExport, ExportError> {
    export_database_at(plan, capture_timestamp(), tables)
}

/// Export already fetched tables under a fixed timestamp.
pub fn export_database_at(
    plan: ExportPlan,
    exported_at: impl Into<String>,
    tables: Vec<TableData>,
) -> Result<DatabaseExport, ExportError> {
    let mut exporter = DatabaseExporter::with_timestamp(plan, exported_at);
    let mut table_documents = Vec::new();

    for table in tables {
        let export = export_table(&table.name, table.columns, table.rows)?;
        if let Some(document) = exporter.add_table(export) {
            table_documents.push(document);
        }
    }

    Ok(DatabaseExport {
        table_documents,
        output: exporter.finish(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::OpaqueValue;
    use chrono::NaiveDate;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use tokio_util::sync::CancellationToken;

    const TS: &str = "2024-03-01T12:00:00";

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn created(day: u32) -> RawValue {
        RawValue::DateTime(
            NaiveDate::from_ymd_opt(2024, 3, day)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        )
    }

    fn shop_tables() -> Vec<TableData> {
        vec![
            TableData {
                name: "users".into(),
                columns: cols(&["id", "name", "created"]),
                rows: vec![
                    vec![RawValue::Int(1), "alice".into(), created(1)],
                    vec![RawValue::Int(2), "bob".into(), created(2)],
                ],
            },
            TableData {
                name: "orders".into(),
                columns: cols(&["id", "user_id", "total"]),
                rows: vec![vec![
                    RawValue::Int(10),
                    RawValue::Int(1),
                    RawValue::Double(19.99),
                ]],
            },
        ]
    }

    fn plan(format: ExportFormat) -> ExportPlan {
        ExportPlan {
            database: "shop".into(),
            format,
            output_dir: PathBuf::from("out"),
            total_tables_in_db: 3,
            selected_tables: vec!["users".into(), "orders".into()],
        }
    }

    #[test]
    fn test_export_table_preserves_count_and_order() {
        let rows: Vec<Vec<RawValue>> = (0..50).map(|i| vec![RawValue::Int(i)]).collect();
        let export = export_table("numbers", cols(&["n"]), rows).unwrap();

        assert_eq!(export.row_count(), 50);
        for (i, row) in export.data.iter().enumerate() {
            assert_eq!(row.len(), 1);
            assert_eq!(row["n"], json!(i));
        }
    }

    #[test]
    fn test_export_table_empty() {
        let export = export_table("empty", cols(&["a", "b"]), Vec::new()).unwrap();
        assert_eq!(export.row_count(), 0);
        assert_eq!(export.columns, cols(&["a", "b"]));
    }

    #[test]
    fn test_export_table_aborts_on_misaligned_row() {
        let rows = vec![
            vec![RawValue::Int(1), RawValue::Int(2)],
            vec![RawValue::Int(3)],
        ];
        let err = export_table("t", cols(&["a", "b"]), rows).unwrap_err();
        match err {
            ExportError::ColumnMismatch { table, row, source } => {
                assert_eq!(table, "t");
                assert_eq!(row, 1);
                assert_eq!(source.expected, 2);
                assert_eq!(source.actual, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_export_table_collects_warnings_per_column() {
        let shape = || RawValue::Opaque(OpaqueValue::unknown("GEOMETRY", "blob"));
        let rows = vec![
            vec![RawValue::Int(1), shape()],
            vec![RawValue::Int(2), shape()],
            vec![RawValue::Int(3), RawValue::Null],
        ];
        let export = export_table("places", cols(&["id", "shape"]), rows).unwrap();

        assert_eq!(
            export.warnings,
            vec![ExportWarning {
                table: "places".into(),
                column: "shape".into(),
                source_type: "GEOMETRY".into(),
                occurrences: 2,
            }]
        );
    }

    #[test]
    fn test_export_table_reports_row_progress_for_large_tables() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let control = ExportControl::new()
            .with_progress_callback(Box::new(move |ev| sink.lock().unwrap().push(ev)));

        let rows: Vec<Vec<RawValue>> = (0..2000).map(|i| vec![RawValue::Int(i)]).collect();
        export_table_with("big", cols(&["n"]), rows, &control).unwrap();

        let events = events.lock().unwrap();
        assert_eq!(events.len(), BATCHES_PER_TABLE);
        assert_eq!(
            events[1],
            ProgressEvent::RowProgress {
                table: "big".into(),
                rows_done: 100,
                total_rows: 2000,
            }
        );
    }

    #[test]
    fn test_export_table_small_tables_are_quiet() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let control = ExportControl::new()
            .with_progress_callback(Box::new(move |ev| sink.lock().unwrap().push(ev)));

        let rows: Vec<Vec<RawValue>> = (0..10).map(|i| vec![RawValue::Int(i)]).collect();
        export_table_with("small", cols(&["n"]), rows, &control).unwrap();

        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn test_export_table_observes_cancellation() {
        let token = CancellationToken::new();
        token.cancel();
        let control = ExportControl::new().with_cancellation(token);

        let rows = vec![vec![RawValue::Int(1)]];
        let err = export_table_with("t", cols(&["n"]), rows, &control).unwrap_err();
        assert!(matches!(err, ExportError::Cancelled));
    }

    #[test]
    fn test_combined_shop_scenario() {
        let export = export_database_at(plan(ExportFormat::Combined), TS, shop_tables()).unwrap();
        assert!(export.table_documents.is_empty());
        assert_eq!(export.output.path, PathBuf::from("out").join("shop_database.json"));

        let doc = serde_json::to_value(&export.output.document).unwrap();
        assert_eq!(doc["database"], "shop");
        assert_eq!(doc["exported_at"], TS);
        assert_eq!(doc["table_count"], 2);
        assert_eq!(doc["tables"]["users"]["row_count"], 2);
        assert_eq!(doc["tables"]["orders"]["data"][0]["total"], json!(19.99));

        let users = doc["tables"]["users"]["data"].as_array().unwrap();
        for row in users {
            let keys: Vec<&String> = row.as_object().unwrap().keys().collect();
            assert_eq!(keys, vec!["id", "name", "created"]);
            assert!(row["created"].is_string());
        }
        assert_eq!(users[0]["created"], "2024-03-01T10:00:00");

        let table_names: Vec<&String> = doc["tables"].as_object().unwrap().keys().collect();
        assert_eq!(table_names, vec!["users", "orders"]);
    }

    #[test]
    fn test_combined_is_deterministic() {
        let first = export_database_at(plan(ExportFormat::Combined), TS, shop_tables()).unwrap();
        let second = export_database_at(plan(ExportFormat::Combined), TS, shop_tables()).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first.output.document).unwrap(),
            serde_json::to_string(&second.output.document).unwrap()
        );
    }

    #[test]
    fn test_separate_mode_documents_and_summary() {
        let export = export_database_at(plan(ExportFormat::Separate), TS, shop_tables()).unwrap();

        let paths: Vec<PathBuf> = export
            .table_documents
            .iter()
            .map(|(p, _)| p.clone())
            .collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("out").join("shop_users.json"),
                PathBuf::from("out").join("shop_orders.json"),
            ]
        );
        for (_, doc) in &export.table_documents {
            assert_eq!(doc.exported_at, TS);
            assert_eq!(doc.database, "shop");
            assert_eq!(doc.row_count, doc.data.len());
        }

        let FinalDocument::Summary(summary) = &export.output.document else {
            panic!("expected summary document");
        };
        assert_eq!(
            export.output.path,
            PathBuf::from("out").join("shop_export_summary.json")
        );
        assert_eq!(summary.table_list, vec!["users", "orders"]);
        assert_eq!(summary.exported_files, paths);
        assert_eq!(summary.total_tables_in_db, 3);
        assert_eq!(summary.selected_tables_count, 2);
        assert_eq!(summary.export_format, "separate_files");

        let value = serde_json::to_value(&export.output.document).unwrap();
        assert!(value.get("tables").is_none());
        assert_eq!(value["output_location"], Value::from("out"));
    }

    #[test]
    fn test_separate_mode_path_for_odd_table_name() {
        let mut exporter = DatabaseExporter::with_timestamp(plan(ExportFormat::Separate), TS);
        let export = export_table("x/../../../tmp/pwn", cols(&["n"]), Vec::new()).unwrap();

        let (path, document) = exporter.add_table(export).unwrap();
        assert_eq!(path, PathBuf::from("out").join("shop_x_.._.._.._tmp_pwn.json"));
        assert_eq!(path.parent(), Some(PathBuf::from("out").as_path()));
        assert_eq!(document.table_name, "x/../../../tmp/pwn");
    }

    #[test]
    fn test_separate_mode_lists_only_processed_tables() {
        let mut exporter = DatabaseExporter::with_timestamp(plan(ExportFormat::Separate), TS);
        let users = export_table("users", cols(&["id"]), vec![vec![RawValue::Int(1)]]).unwrap();
        exporter.add_table(users);

        let output = exporter.finish();
        let FinalDocument::Summary(summary) = output.document else {
            panic!("expected summary document");
        };
        assert_eq!(summary.exported_files.len(), 1);
        assert_eq!(summary.table_list.len(), 2);
    }

    #[test]
    fn test_export_database_fails_fast() {
        let mut tables = shop_tables();
        tables[1].rows.push(vec![RawValue::Int(1)]);

        let err = export_database_at(plan(ExportFormat::Combined), TS, tables).unwrap_err();
        assert!(matches!(err, ExportError::ColumnMismatch { ref table, .. } if table == "orders"));
    }

    #[test]
    fn test_timestamp_shared_across_tables() {
        let export = export_database(plan(ExportFormat::Separate), shop_tables()).unwrap();
        let stamps: Vec<&str> = export
            .table_documents
            .iter()
            .map(|(_, d)| d.exported_at.as_str())
            .collect();
        assert!(stamps.windows(2).all(|w| w[0] == w[1]));

        let FinalDocument::Summary(summary) = &export.output.document else {
            panic!("expected summary document");
        };
        assert_eq!(summary.exported_at, stamps[0]);
    }

    #[test]
    fn test_format_strings() {
        assert_eq!(ExportFormat::Combined.as_str(), "single_file");
        assert_eq!(ExportFormat::Separate.as_str(), "separate_files");
        assert_eq!(ExportFormat::default(), ExportFormat::Combined);
    }
}
