//! Read-only overview of a database, used by `check` and `list-tables`

use crate::session::ExportSession;
use crate::SourceOpts;
use anyhow::Result;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableOverview {
    pub name: String,
    pub column_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseOverview {
    pub database: String,
    pub server_version: String,
    pub tables: Vec<TableOverview>,
}

/// Result of a connectivity check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionCheck {
    pub database: String,
    pub server_version: String,
    pub table_count: usize,
}

/// Connect, count the tables, and disconnect.
pub async fn check_connection(opts: &SourceOpts) -> Result<ConnectionCheck> {
    let mut session = ExportSession::connect(opts).await?;
    let result = session.count_tables().await.map(|table_count| ConnectionCheck {
        database: session.database().to_string(),
        server_version: session.server_version(),
        table_count,
    });
    if let Err(e) = session.disconnect().await {
        warn!("{e:#}");
    }
    result
}

/// Connect, list the tables with their column counts, and disconnect.
pub async fn inspect_database(opts: &SourceOpts) -> Result<DatabaseOverview> {
    let mut session = ExportSession::connect(opts).await?;
    let result = collect_overview(&mut session).await;
    if let Err(e) = session.disconnect().await {
        warn!("{e:#}");
    }
    result
}

async fn collect_overview(session: &mut ExportSession) -> Result<DatabaseOverview> {
    let mut tables = Vec::new();
    for name in session.list_tables().await? {
        let column_count = session.table_columns(&name).await?.len();
        tables.push(TableOverview { name, column_count });
    }
    Ok(DatabaseOverview {
        database: session.database().to_string(),
        server_version: session.server_version(),
        tables,
    })
}
