//! Progress events and cooperative cancellation.
//!
//! The export never talks to a UI. It emits [`ProgressEvent`]s through an
//! optional callback and polls a [`CancellationToken`] between tables and
//! between row batches.

use crate::writer::WrittenFile;
use tokio_util::sync::CancellationToken;

/// Progress callback for export operations
pub type ProgressCallback = Box<dyn Fn(ProgressEvent) + Send + Sync>;

/// Something that happened during an export run.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    RunStarted {
        database: String,
        total_tables: usize,
    },
    TableStarted {
        table: String,
        /// 1-based
        index: usize,
        total: usize,
    },
    RowProgress {
        table: String,
        rows_done: usize,
        total_rows: usize,
    },
    TableFinished {
        table: String,
        index: usize,
        total: usize,
        row_count: usize,
        /// Set when the table was written to its own file
        file: Option<WrittenFile>,
    },
    RunFinished {
        files: Vec<WrittenFile>,
        total_rows: usize,
    },
    RunCancelled {
        completed_tables: Vec<String>,
    },
    RunFailed {
        error: String,
        completed_tables: Vec<String>,
    },
}

impl ProgressEvent {
    /// Overall completion in percent, for events that imply one.
    pub fn percent(&self) -> Option<u8> {
        match self {
            Self::RowProgress {
                rows_done,
                total_rows,
                ..
            } => Some(ratio_percent(*rows_done, *total_rows)),
            Self::TableFinished { index, total, .. } => Some(ratio_percent(*index, *total)),
            Self::RunFinished { .. } => Some(100),
            _ => None,
        }
    }
}

fn ratio_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u8
}

/// Progress reporting and cancellation handed to an export run.
#[derive(Default)]
pub struct ExportControl {
    progress_callback: Option<ProgressCallback>,
    cancel: CancellationToken,
}

impl ExportControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set progress callback
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn report(&self, event: ProgressEvent) {
        if let Some(ref callback) = self.progress_callback {
            callback(event);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl std::fmt::Debug for ExportControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportControl")
            .field("has_progress_callback", &self.progress_callback.is_some())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_report_reaches_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let control = ExportControl::new()
            .with_progress_callback(Box::new(move |ev| sink.lock().unwrap().push(ev)));

        control.report(ProgressEvent::RunStarted {
            database: "shop".into(),
            total_tables: 2,
        });

        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_cancellation_is_shared() {
        let token = CancellationToken::new();
        let control = ExportControl::new().with_cancellation(token.clone());
        assert!(!control.is_cancelled());
        token.cancel();
        assert!(control.is_cancelled());
    }

    #[test]
    fn test_percent() {
        let ev = ProgressEvent::RowProgress {
            table: "t".into(),
            rows_done: 250,
            total_rows: 1000,
        };
        assert_eq!(ev.percent(), Some(25));

        let ev = ProgressEvent::TableStarted {
            table: "t".into(),
            index: 1,
            total: 2,
        };
        assert_eq!(ev.percent(), None);
    }
}
