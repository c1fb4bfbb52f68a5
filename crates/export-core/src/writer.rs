//! Output file naming and pretty JSON writing.

use crate::error::ExportError;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// A file written by the export, with its size on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub bytes: u64,
}

impl WrittenFile {
    /// File name without its directory, for log lines.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// `<database>_database.json`
pub fn combined_file_name(database: &str) -> String {
    format!("{}_database.json", file_component(database))
}

/// `<database>_<table>.json`
pub fn table_file_name(database: &str, table: &str) -> String {
    format!("{}_{}.json", file_component(database), file_component(table))
}

/// `<database>_export_summary.json`
pub fn summary_file_name(database: &str) -> String {
    format!("{}_export_summary.json", file_component(database))
}

// Quoted MySQL identifiers may contain path separators; the result is always
// a single file name inside the output directory.
fn file_component(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect()
}

/// Fail early when the output directory is missing.
pub fn validate_output_dir(dir: &Path) -> Result<(), ExportError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(ExportError::InvalidOutputDir(dir.to_path_buf()))
    }
}

/// Serialize `document` as pretty JSON (2-space indent, non-ASCII kept as is)
/// and return the written size.
pub fn write_json<T: Serialize + ?Sized>(
    path: &Path,
    document: &T,
) -> Result<WrittenFile, ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, document).map_err(|source| {
        ExportError::Serialize {
            path: path.to_path_buf(),
            source,
        }
    })?;
    writer.flush().map_err(io_err)?;
    drop(writer);

    let bytes = std::fs::metadata(path).map_err(io_err)?.len();
    tracing::debug!("Wrote {} ({} bytes)", path.display(), bytes);

    Ok(WrittenFile {
        path: path.to_path_buf(),
        bytes,
    })
}

/// Human readable size: `0 B`, `512.0 B`, `1.5 KB`, ... capped at GB.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.1} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_file_names() {
        assert_eq!(combined_file_name("shop"), "shop_database.json");
        assert_eq!(table_file_name("shop", "users"), "shop_users.json");
        assert_eq!(summary_file_name("shop"), "shop_export_summary.json");
    }

    #[test]
    fn test_file_names_stay_in_output_dir() {
        assert_eq!(
            table_file_name("shop", "x/../../evil"),
            "shop_x_.._.._evil.json"
        );
        assert_eq!(table_file_name("shop", "a\\b"), "shop_a_b.json");
        assert_eq!(table_file_name("shop", ".."), "shop_...json");
        assert_eq!(combined_file_name("../shop"), ".._shop_database.json");
        assert_eq!(summary_file_name("a/b"), "a_b_export_summary.json");

        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir(&out).unwrap();
        let written = write_json(&out.join(table_file_name("shop", "x/../../evil")), &json!({}))
            .unwrap();
        assert_eq!(written.path.parent(), Some(out.as_path()));
        assert!(!dir.path().join("evil.json").exists());
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512.0 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(2 * 1024 * 1024), "2.0 MB");
        assert_eq!(format_file_size(1024 * 1024 * 1024), "1.0 GB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024 * 1024), "3072.0 GB");
    }

    #[test]
    fn test_write_json_pretty_and_unescaped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");

        let written = write_json(&path, &json!({"name": "Zoë"})).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\n  \"name\": \"Zoë\"\n}");
        assert_eq!(written.bytes, content.len() as u64);
        assert_eq!(written.file_name(), "out.json");
    }

    #[test]
    fn test_write_json_into_missing_dir_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("out.json");

        let err = write_json(&path, &json!({})).unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }

    #[test]
    fn test_validate_output_dir() {
        let dir = TempDir::new().unwrap();
        assert!(validate_output_dir(dir.path()).is_ok());

        let file = dir.path().join("f");
        std::fs::write(&file, "x").unwrap();
        assert!(matches!(
            validate_output_dir(&file),
            Err(ExportError::InvalidOutputDir(_))
        ));
    }
}
