use clap::Parser;
use export_core::ExportFormat;
use mysql_json_export::{resolve_export, ConfigFile, ConnectionArgs, ExportArgs, FormatArg};
use std::path::PathBuf;

#[derive(Parser)]
struct TestCli {
    #[command(flatten)]
    export: ExportArgs,
}

#[test]
fn test_export_args_parse() {
    let cli = TestCli::try_parse_from([
        "mysql-json-export",
        "--host",
        "db.internal",
        "--port",
        "3307",
        "--database",
        "shop",
        "--tables",
        "users,orders",
        "--format",
        "separate",
        "--output-dir",
        "/tmp/out",
    ])
    .unwrap();

    assert_eq!(cli.export.connection.host.as_deref(), Some("db.internal"));
    assert_eq!(cli.export.connection.port, Some(3307));
    assert_eq!(cli.export.tables, vec!["users", "orders"]);
    assert_eq!(cli.export.format, Some(FormatArg::Separate));

    let config = resolve_export(&cli.export, &ConfigFile::default());
    assert_eq!(config.format, ExportFormat::Separate);
    assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
    assert_eq!(config.source.database.as_deref(), Some("shop"));
}

#[test]
fn test_invalid_format_is_rejected() {
    let result = TestCli::try_parse_from(["mysql-json-export", "--format", "xml"]);
    assert!(result.is_err());
}

#[test]
fn test_connection_args_default() {
    let args = ConnectionArgs::default();
    assert!(args.host.is_none());
    assert!(args.password.is_none());
    assert!(args.load_config().unwrap() == ConfigFile::default());
}

#[test]
fn test_config_file_from_flag() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.yaml");
    std::fs::write(
        &path,
        "connection:\n  database: shop\nexport:\n  format: separate\n",
    )
    .unwrap();

    let args = ExportArgs {
        connection: ConnectionArgs {
            config: Some(path),
            ..Default::default()
        },
        ..Default::default()
    };
    let file = args.connection.load_config().unwrap();
    let config = resolve_export(&args, &file);
    assert_eq!(config.source.database.as_deref(), Some("shop"));
    assert_eq!(config.format, ExportFormat::Separate);
}
