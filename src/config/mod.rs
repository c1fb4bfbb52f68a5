//! YAML config file and option resolution.
//!
//! Every setting resolves the same way: command-line flag (or its
//! environment variable), then the config file, then the built-in default.
//!
//! ```yaml
//! connection:
//!   host: db.internal
//!   port: 3306
//!   user: reporter
//!   password: secret
//!   database: shop
//! export:
//!   tables: [users, orders]
//!   format: separate
//!   output_dir: ./exports
//! ```

use crate::{ConnectionArgs, ExportArgs};
use anyhow::Context;
use export_core::ExportFormat;
use mysql_json_export_source::{ExportConfig, SourceOpts};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub connection: ConnectionSection,
    pub export: ExportSection,
}

#[derive(Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectionSection {
    pub connection_string: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
}

impl std::fmt::Debug for ConnectionSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSection")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportSection {
    pub tables: Vec<String>,
    pub format: Option<ExportFormat>,
    pub output_dir: Option<PathBuf>,
}

impl ConfigFile {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path:?}"))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse config file: {path:?}"))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Connection options from flags, falling back to the file, then defaults.
pub fn resolve_source(args: &ConnectionArgs, file: &ConnectionSection) -> SourceOpts {
    let defaults = SourceOpts::default();
    SourceOpts {
        connection_string: args
            .connection_string
            .clone()
            .or_else(|| file.connection_string.clone()),
        host: args
            .host
            .clone()
            .or_else(|| file.host.clone())
            .unwrap_or(defaults.host),
        port: args.port.or(file.port).unwrap_or(defaults.port),
        user: args
            .user
            .clone()
            .or_else(|| file.user.clone())
            .unwrap_or(defaults.user),
        password: args.password.clone().or_else(|| file.password.clone()),
        database: args.database.clone().or_else(|| file.database.clone()),
    }
}

/// The full export configuration for one run.
pub fn resolve_export(args: &ExportArgs, file: &ConfigFile) -> ExportConfig {
    let requested = if args.tables.is_empty() {
        &file.export.tables
    } else {
        &args.tables
    };

    ExportConfig {
        source: resolve_source(&args.connection, &file.connection),
        tables: clean_table_list(requested),
        format: args
            .format
            .map(ExportFormat::from)
            .or(file.export.format)
            .unwrap_or_default(),
        output_dir: args
            .output_dir
            .clone()
            .or_else(|| file.export.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

// `--tables "users, orders,"` is the same as `--tables users,orders`
fn clean_table_list(tables: &[String]) -> Vec<String> {
    tables
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
