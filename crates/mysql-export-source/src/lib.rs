//! MySQL source for mysql-json-export
//!
//! Reads every selected table of one MySQL database with `SELECT *`, maps the
//! driver values through `mysql-types`, normalizes them with `export-core`
//! and writes the resulting JSON documents.

mod client;
mod export;
mod inspect;
mod report;
mod schema;
mod session;
pub mod testing;

pub use client::{new_mysql_pool, sanitize_connection_string};
pub use export::run_export;
pub use export_core::ExportFormat;
pub use inspect::{
    check_connection, inspect_database, ConnectionCheck, DatabaseOverview, TableOverview,
};
pub use report::{ExportFailure, ExportReport, ExportStatus, TableSummary};
pub use schema::{quote_identifier, select_tables};
pub use session::ExportSession;

use std::path::PathBuf;

/// MySQL source connection options
#[derive(Clone)]
pub struct SourceOpts {
    /// MySQL connection URI; when set, host, port, user and password are ignored
    pub connection_string: Option<String>,
    /// Server host name or IP
    pub host: String,
    /// Server port
    pub port: u16,
    /// User name
    pub user: String,
    /// Password, if the account has one
    pub password: Option<String>,
    /// Database to export; falls back to the database in the connection URI
    pub database: Option<String>,
}

impl Default for SourceOpts {
    fn default() -> Self {
        Self {
            connection_string: None,
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: None,
            database: None,
        }
    }
}

impl SourceOpts {
    /// Connection target suitable for logs; never contains the password.
    pub fn display_target(&self) -> String {
        match &self.connection_string {
            Some(uri) => sanitize_connection_string(uri),
            None => format!(
                "mysql://{}@{}:{}/{}",
                self.user,
                self.host,
                self.port,
                self.database.as_deref().unwrap_or("")
            ),
        }
    }
}

impl std::fmt::Debug for SourceOpts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceOpts")
            .field("target", &self.display_target())
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Everything one export run needs, decided up front by the front end
#[derive(Clone, Debug)]
pub struct ExportConfig {
    /// Where to read from
    pub source: SourceOpts,
    /// Tables to export, in order; empty means every table
    pub tables: Vec<String>,
    /// Combined file or one file per table
    pub format: ExportFormat,
    /// Existing directory the JSON files are written to
    pub output_dir: PathBuf,
}
