//! Table and column enumeration
//!
//! Table names and column order come from `INFORMATION_SCHEMA`, so the
//! column list of an empty table is still known.

use anyhow::{anyhow, bail, Result};
use export_core::RawValue;
use mysql_async::prelude::*;
use mysql_types::row_to_raw_values;

/// Quote a MySQL identifier with backticks, doubling embedded backticks.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// List all tables and views of `database`, sorted by name.
pub async fn list_tables(conn: &mut mysql_async::Conn, database: &str) -> Result<Vec<String>> {
    let query = "
        SELECT TABLE_NAME
        FROM INFORMATION_SCHEMA.TABLES
        WHERE TABLE_SCHEMA = ?
        ORDER BY TABLE_NAME";

    let rows: Vec<mysql_async::Row> = conn.exec(query, (database,)).await?;
    rows.into_iter()
        .map(|row| {
            row.get::<String, _>(0)
                .ok_or_else(|| anyhow!("Missing table name"))
        })
        .collect()
}

/// Number of tables and views in `database`.
pub async fn count_tables(conn: &mut mysql_async::Conn, database: &str) -> Result<usize> {
    let count: Option<u64> = conn
        .exec_first(
            "SELECT COUNT(*) FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_SCHEMA = ?",
            (database,),
        )
        .await?;
    Ok(count.unwrap_or(0) as usize)
}

/// Column names of `table` in ordinal position order.
pub async fn table_columns(
    conn: &mut mysql_async::Conn,
    database: &str,
    table: &str,
) -> Result<Vec<String>> {
    let query = "
        SELECT COLUMN_NAME
        FROM INFORMATION_SCHEMA.COLUMNS
        WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
        ORDER BY ORDINAL_POSITION";

    let rows: Vec<mysql_async::Row> = conn.exec(query, (database, table)).await?;
    let columns = rows
        .into_iter()
        .map(|row| {
            row.get::<String, _>(0)
                .ok_or_else(|| anyhow!("Missing column name for table '{table}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    if columns.is_empty() {
        bail!("Table '{table}' has no columns or does not exist in '{database}'");
    }
    Ok(columns)
}

/// Fetch every row of `table` in server order, mapped to raw values.
///
/// Columns are selected by name so each row lines up with `columns`, which
/// also picks up INVISIBLE columns that `SELECT *` would leave out.
pub async fn fetch_rows(
    conn: &mut mysql_async::Conn,
    table: &str,
    columns: &[String],
) -> Result<Vec<Vec<RawValue>>> {
    let query = select_all_query(table, columns);
    let rows: Vec<mysql_async::Row> = conn
        .exec(query, ())
        .await
        .map_err(|e| anyhow!("Failed to read table '{table}': {e}"))?;
    Ok(rows.into_iter().map(row_to_raw_values).collect())
}

fn select_all_query(table: &str, columns: &[String]) -> String {
    let select_list = columns
        .iter()
        .map(|c| quote_identifier(c))
        .collect::<Vec<_>>()
        .join(", ");
    format!("SELECT {select_list} FROM {}", quote_identifier(table))
}

/// Resolve the requested table list against what the database has.
///
/// An empty request selects every table. Requested order is kept and
/// repeated names are exported once.
pub fn select_tables(
    available: &[String],
    requested: &[String],
    database: &str,
) -> Result<Vec<String>> {
    if requested.is_empty() {
        return Ok(available.to_vec());
    }

    let mut selected: Vec<String> = Vec::with_capacity(requested.len());
    for table in requested {
        if !available.contains(table) {
            bail!("Table '{table}' not found in database '{database}'");
        }
        if !selected.contains(table) {
            selected.push(table.clone());
        }
    }
    Ok(selected)
}
