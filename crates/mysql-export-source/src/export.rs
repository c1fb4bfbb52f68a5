//! Export runner
//!
//! Drives one run end to end: connect, pick tables, read and normalize each
//! table in turn, write the documents, disconnect. A failing table stops the
//! run; cancellation is honored between tables and between row batches.

use crate::report::{ExportFailure, ExportReport, ExportStatus, TableSummary};
use crate::schema::select_tables;
use crate::session::ExportSession;
use crate::ExportConfig;
use anyhow::Result;
use export_core::writer::validate_output_dir;
use export_core::{
    capture_timestamp, export_table_with, format_file_size, write_json, DatabaseExporter,
    ExportControl, ExportError, ExportPlan, ProgressEvent,
};
use tracing::{info, warn};

/// Run one export with the given configuration.
///
/// Progress goes to `control`'s callback. On error the tables finished
/// before the failure are returned with it; files already written stay on disk.
pub async fn run_export(
    config: &ExportConfig,
    control: &ExportControl,
) -> Result<ExportReport, ExportFailure> {
    let mut completed = Vec::new();

    match export_all(config, control, &mut completed).await {
        Ok(report) => {
            match report.status {
                ExportStatus::Completed => control.report(ProgressEvent::RunFinished {
                    files: report.written_files(),
                    total_rows: report.total_rows(),
                }),
                ExportStatus::Cancelled => control.report(ProgressEvent::RunCancelled {
                    completed_tables: report.completed_tables(),
                }),
            }
            Ok(report)
        }
        Err(error) => {
            control.report(ProgressEvent::RunFailed {
                error: format!("{error:#}"),
                completed_tables: completed.iter().map(|t| t.name.clone()).collect(),
            });
            Err(ExportFailure { error, completed })
        }
    }
}

async fn export_all(
    config: &ExportConfig,
    control: &ExportControl,
    completed: &mut Vec<TableSummary>,
) -> Result<ExportReport> {
    let exported_at = capture_timestamp();
    validate_output_dir(&config.output_dir)?;

    let mut session = ExportSession::connect(&config.source).await?;
    let result =
        export_with_session(&mut session, config, control, exported_at, completed).await;

    if let Err(e) = session.disconnect().await {
        warn!("{e:#}");
    }
    result
}

async fn export_with_session(
    session: &mut ExportSession,
    config: &ExportConfig,
    control: &ExportControl,
    exported_at: String,
    completed: &mut Vec<TableSummary>,
) -> Result<ExportReport> {
    let database = session.database().to_string();
    let available = session.list_tables().await?;
    let selected = select_tables(&available, &config.tables, &database)?;
    info!(
        "Found {} tables in {}, exporting {}",
        available.len(),
        database,
        selected.len()
    );

    let mut exporter = DatabaseExporter::with_timestamp(
        ExportPlan {
            database: database.clone(),
            format: config.format,
            output_dir: config.output_dir.clone(),
            total_tables_in_db: available.len(),
            selected_tables: selected.clone(),
        },
        exported_at,
    );

    let total = selected.len();
    control.report(ProgressEvent::RunStarted {
        database: database.clone(),
        total_tables: total,
    });

    let mut cancelled = false;
    for (i, table) in selected.iter().enumerate() {
        let index = i + 1;
        if control.is_cancelled() {
            cancelled = true;
            break;
        }

        control.report(ProgressEvent::TableStarted {
            table: table.clone(),
            index,
            total,
        });
        info!("Processing table: {} ({}/{})", table, index, total);

        let columns = session.table_columns(table).await?;
        let rows = session.fetch_rows(table, &columns).await?;
        info!("Columns: {} | Rows: {}", columns.len(), rows.len());

        let export = match export_table_with(table, columns, rows, control) {
            Ok(export) => export,
            Err(ExportError::Cancelled) => {
                cancelled = true;
                break;
            }
            Err(e) => return Err(e.into()),
        };
        for warning in &export.warnings {
            warn!("{warning}");
        }

        let row_count = export.row_count();
        let file = match exporter.add_table(export) {
            Some((path, document)) => {
                let written = write_json(&path, &document)?;
                info!(
                    "Saved: {} ({})",
                    written.file_name(),
                    format_file_size(written.bytes)
                );
                Some(written)
            }
            None => None,
        };

        completed.push(TableSummary {
            name: table.clone(),
            row_count,
            file: file.clone(),
        });
        control.report(ProgressEvent::TableFinished {
            table: table.clone(),
            index,
            total,
            row_count,
            file,
        });
    }

    let exported_at = exporter.exported_at().to_string();
    let warnings = exporter.warnings().to_vec();

    let (status, output_file) = if cancelled {
        info!(
            "Export cancelled after {} of {} tables",
            completed.len(),
            total
        );
        (ExportStatus::Cancelled, None)
    } else {
        let output = exporter.finish();
        let written = write_json(&output.path, &output.document)?;
        info!(
            "Saved: {} ({})",
            written.file_name(),
            format_file_size(written.bytes)
        );
        (ExportStatus::Completed, Some(written))
    };

    Ok(ExportReport {
        status,
        database,
        exported_at,
        format: config.format,
        output_dir: config.output_dir.clone(),
        tables: completed.clone(),
        output_file,
        warnings,
    })
}
