//! Command-line interface for mysql-json-export
//!
//! # Usage Examples
//!
//! ```bash
//! # Whole database into one file
//! mysql-json-export export --host localhost --user root --database shop
//!
//! # Selected tables, one file each
//! mysql-json-export export --database shop --tables users,orders \
//!   --format separate --output-dir ./exports
//!
//! # Tables and their column counts
//! mysql-json-export list-tables --database shop
//!
//! # Connectivity check
//! mysql-json-export check --database shop
//! ```
//!
//! Exit status is 0 on success, 1 on error and 130 when interrupted.

use anyhow::Context;
use clap::{Parser, Subcommand};
use export_core::ExportControl;
use mysql_json_export::interrupt::watch_interrupts;
use mysql_json_export::{console, resolve_export, resolve_source, ConnectionArgs, ExportArgs};
use mysql_json_export_source::{check_connection, inspect_database, run_export, ExportStatus};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Exit status after Ctrl-C, as a shell would report SIGINT
const EXIT_CANCELLED: i32 = 130;

#[derive(Parser)]
#[command(name = "mysql-json-export")]
#[command(about = "Export MySQL tables to JSON files")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export tables to JSON
    Export(ExportArgs),

    /// List tables with their column counts
    ListTables(ConnectionArgs),

    /// Check the connection and report the number of tables
    Check(ConnectionArgs),
}

enum Outcome {
    Done,
    Cancelled,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match run().await {
        Ok(Outcome::Done) => {}
        Ok(Outcome::Cancelled) => std::process::exit(EXIT_CANCELLED),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
    Ok(())
}

async fn run() -> anyhow::Result<Outcome> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export(args) => run_export_command(args).await,
        Commands::ListTables(args) => {
            run_list_tables(args).await?;
            Ok(Outcome::Done)
        }
        Commands::Check(args) => {
            run_check(args).await?;
            Ok(Outcome::Done)
        }
    }
}

async fn run_export_command(args: ExportArgs) -> anyhow::Result<Outcome> {
    let file = args.connection.load_config()?;
    let config = resolve_export(&args, &file);
    tracing::info!(
        "Exporting {} to {} ({})",
        config.source.display_target(),
        config.output_dir.display(),
        config.format.as_str()
    );

    let (tx, mut rx) = mpsc::unbounded_channel();
    let token = CancellationToken::new();
    let control = ExportControl::new()
        .with_cancellation(token.clone())
        .with_progress_callback(Box::new(move |event| {
            let _ = tx.send(event);
        }));

    let (interrupt_tx, interrupt_rx) = mpsc::unbounded_channel();
    let ctrl_c = tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if interrupt_tx.send(()).is_err() {
                break;
            }
        }
    });
    let signal = tokio::spawn(async move {
        if watch_interrupts(token, interrupt_rx).await {
            eprintln!("Aborted");
            std::process::exit(EXIT_CANCELLED);
        }
    });

    // The channel closes when the worker drops its control
    let worker = tokio::spawn(async move { run_export(&config, &control).await });
    while let Some(event) = rx.recv().await {
        console::render_event(&event);
    }
    signal.abort();
    ctrl_c.abort();
    let result = worker.await.context("Export task failed")?;

    let report = result.map_err(|failure| failure.error)?;
    match report.status {
        ExportStatus::Completed => Ok(Outcome::Done),
        ExportStatus::Cancelled => Ok(Outcome::Cancelled),
    }
}

async fn run_list_tables(args: ConnectionArgs) -> anyhow::Result<()> {
    let file = args.load_config()?;
    let source = resolve_source(&args, &file.connection);
    let overview = inspect_database(&source).await?;

    println!("Tables in {}:", overview.database);
    for (i, table) in overview.tables.iter().enumerate() {
        println!(
            "  {:>3}. {} ({} columns)",
            i + 1,
            table.name,
            table.column_count
        );
    }
    println!("Total: {} tables", overview.tables.len());
    Ok(())
}

async fn run_check(args: ConnectionArgs) -> anyhow::Result<()> {
    let file = args.load_config()?;
    let source = resolve_source(&args, &file.connection);
    let check = check_connection(&source).await?;

    println!(
        "Connected to MySQL {} at {}",
        check.server_version,
        source.display_target()
    );
    println!(
        "Database '{}' has {} tables",
        check.database, check.table_count
    );
    Ok(())
}
