//! Core types for mysql-json-export.
//!
//! This crate turns rows read from a relational database into JSON documents.
//! It knows nothing about any particular driver: the driver crates map their
//! native values into [`RawValue`] and hand whole tables to the exporters here.
//!
//! - [`RawValue`] - driver-neutral column value, before JSON coercion
//! - [`normalize`] - one raw row → one column-keyed JSON object
//! - [`export_table`] - a table's rows → [`TableExport`]
//! - [`DatabaseExporter`] / [`export_database`] - selected tables → combined
//!   document, or per-table documents plus a summary document
//! - [`ProgressEvent`] / [`ExportControl`] - progress reporting and cooperative
//!   cancellation
//! - [`writer`] - file naming and pretty JSON output
//!
//! # Architecture
//!
//! ```text
//! mysql-types            (mysql_async::Value → RawValue)
//!    │
//! export-core (this crate)
//!    │
//! mysql-export-source    (session, schema enumeration, export runner)
//! ```
//!
//! # Example
//!
//! ```rust
//! use export_core::{export_table, RawValue};
//!
//! let columns = vec!["id".to_string(), "name".to_string()];
//! let rows = vec![vec![RawValue::Int(1), RawValue::Text("Alice".into())]];
//!
//! let table = export_table("users", columns, rows).unwrap();
//! assert_eq!(table.row_count(), 1);
//! assert_eq!(table.data[0]["name"], "Alice");
//! ```

pub mod document;
pub mod error;
pub mod exporter;
pub mod normalize;
pub mod progress;
pub mod value;
pub mod writer;

pub use document::{
    CombinedDocument, FinalDocument, SummaryDocument, TableDocument, TableEntry, TableExport,
};
pub use error::{ExportError, RowShapeError};
pub use exporter::{
    export_database, export_database_at, export_table, export_table_with, DatabaseExport,
    DatabaseExporter, ExportFormat, ExportPlan, FinalOutput, TableData,
};
pub use normalize::{normalize, normalize_value, ExportWarning, Normalized, NormalizedRow};
pub use progress::{ExportControl, ProgressCallback, ProgressEvent};
pub use value::{capture_timestamp, format_date, format_datetime, OpaqueValue, RawValue};
pub use writer::{format_file_size, write_json, WrittenFile};
