//! Console rendering of export progress.
//!
//! The runner already logs each table as it starts and each file as it is
//! saved; this adds the percentages and the end-of-run summary.

use export_core::{format_file_size, ProgressEvent};
use tracing::{debug, info, warn};

/// Log one progress event.
pub fn render_event(event: &ProgressEvent) {
    let Some(line) = event_line(event) else {
        return;
    };
    match event {
        ProgressEvent::RunCancelled { .. } | ProgressEvent::RunFailed { .. } => warn!("{line}"),
        ProgressEvent::RunStarted { .. } | ProgressEvent::TableStarted { .. } => debug!("{line}"),
        _ => info!("{line}"),
    }
}

/// Text for an event, or `None` for events that need no line of their own.
pub fn event_line(event: &ProgressEvent) -> Option<String> {
    let percent = event.percent().unwrap_or(0);
    let line = match event {
        ProgressEvent::RunStarted {
            database,
            total_tables,
        } => format!("Exporting {total_tables} tables from {database}"),
        ProgressEvent::TableStarted { table, index, total } => {
            format!("Starting {table} ({index}/{total})")
        }
        ProgressEvent::RowProgress {
            table,
            rows_done,
            total_rows,
        } => format!("[{percent:>3}%] {table}: {rows_done}/{total_rows} rows"),
        ProgressEvent::TableFinished {
            table,
            index,
            total,
            row_count,
            ..
        } => format!("[{percent:>3}%] {table} done: {row_count} rows ({index}/{total} tables)"),
        ProgressEvent::RunFinished { files, total_rows } => {
            let bytes: u64 = files.iter().map(|f| f.bytes).sum();
            let names: Vec<String> = files.iter().map(|f| f.file_name()).collect();
            format!(
                "Export completed: {total_rows} rows, {} files, {} [{}]",
                files.len(),
                format_file_size(bytes),
                names.join(", ")
            )
        }
        ProgressEvent::RunCancelled { completed_tables } => {
            if completed_tables.is_empty() {
                "Export cancelled before any table completed".to_string()
            } else {
                format!(
                    "Export cancelled; completed tables: {}",
                    completed_tables.join(", ")
                )
            }
        }
        ProgressEvent::RunFailed {
            completed_tables, ..
        } => {
            if completed_tables.is_empty() {
                return None;
            }
            format!(
                "Export failed; tables completed before the error: {}",
                completed_tables.join(", ")
            )
        }
    };
    Some(line)
}
