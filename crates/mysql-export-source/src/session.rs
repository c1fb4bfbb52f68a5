//! One connection held for the length of an export run

use crate::client::new_mysql_pool;
use crate::schema;
use crate::SourceOpts;
use anyhow::{anyhow, Context, Result};
use export_core::RawValue;
use mysql_async::{Conn, Pool};
use tracing::{debug, info};

/// Connected session against the database being exported
pub struct ExportSession {
    pool: Pool,
    conn: Conn,
    database: String,
}

impl ExportSession {
    /// Open a connection to the configured server and database.
    pub async fn connect(opts: &SourceOpts) -> Result<Self> {
        let target = opts.display_target();
        let (pool, database) = new_mysql_pool(opts)?;
        let conn = match pool.get_conn().await {
            Ok(conn) => conn,
            Err(e) => {
                let _ = pool.disconnect().await;
                return Err(anyhow!("Failed to connect to MySQL at {target}: {e}"));
            }
        };
        info!("Connected to MySQL at {}", target);
        Ok(Self {
            pool,
            conn,
            database,
        })
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Server version as reported in the handshake.
    pub fn server_version(&self) -> String {
        let (major, minor, patch) = self.conn.server_version();
        format!("{major}.{minor}.{patch}")
    }

    pub async fn list_tables(&mut self) -> Result<Vec<String>> {
        schema::list_tables(&mut self.conn, &self.database).await
    }

    pub async fn count_tables(&mut self) -> Result<usize> {
        schema::count_tables(&mut self.conn, &self.database).await
    }

    pub async fn table_columns(&mut self, table: &str) -> Result<Vec<String>> {
        schema::table_columns(&mut self.conn, &self.database, table).await
    }

    /// Read all rows of `table`, one value per entry of `columns`.
    pub async fn fetch_rows(
        &mut self,
        table: &str,
        columns: &[String],
    ) -> Result<Vec<Vec<RawValue>>> {
        let rows = schema::fetch_rows(&mut self.conn, table, columns).await?;
        debug!("Fetched {} rows from {}", rows.len(), table);
        Ok(rows)
    }

    /// Close the connection and the pool behind it.
    pub async fn disconnect(self) -> Result<()> {
        let Self { pool, conn, .. } = self;
        drop(conn);
        pool.disconnect()
            .await
            .context("Failed to disconnect from MySQL")?;
        debug!("Disconnected from MySQL");
        Ok(())
    }
}
