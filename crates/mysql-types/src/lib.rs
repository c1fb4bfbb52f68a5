//! MySQL type conversions for export-core raw values.
//!
//! This crate maps what `mysql_async` hands back for a column (a `Value`
//! plus the column's type and flags) onto export-core's driver-neutral
//! `RawValue`.
//!
//! # Structure
//!
//! - `reverse`: Convert MySQL values → `RawValue` (for reading data)
//!
//! # Example
//!
//! ```rust,ignore
//! use mysql_types::row_to_raw_values;
//!
//! let rows: Vec<mysql_async::Row> = conn.exec("SELECT * FROM `users`", ()).await?;
//! let raw: Vec<Vec<export_core::RawValue>> = rows.into_iter().map(row_to_raw_values).collect();
//! ```

pub mod reverse;

pub use reverse::{format_mysql_time, row_to_raw_values, MySQLValueWithSchema};
