//! rusty-sheet-loader - loads spreadsheet sheets into DuckDB tables

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use rusty_sheet_loader::open_workbook;
use rusty_sheet_loader::DuckDbSink;
use rusty_sheet_loader::Loader;
use rusty_sheet_loader::LoaderConfig;
use rusty_sheet_loader::Properties;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rusty-sheet-loader")]
#[command(author, version, about = "Load spreadsheet sheets into database tables", long_about = None)]
struct Cli {
    /// Workbook to load (.xlsx, .xlsm)
    #[arg(short, long)]
    file: PathBuf,

    /// DuckDB database file (defaults to an in-memory database)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Target schema
    #[arg(long, default_value = "public")]
    schema: String,

    /// Comma separated sheet names (defaults to the first sheet)
    #[arg(long, default_value = "")]
    sheets: String,

    /// Comma separated table names, one per sheet
    #[arg(long, default_value = "")]
    tables: String,

    /// Comma separated 1-based header row numbers, one per sheet
    #[arg(long, default_value = "")]
    header_rows: String,

    /// Comma separated 1-based first data row numbers, one per sheet
    #[arg(long, default_value = "")]
    first_data_rows: String,

    /// Comma separated 1-based last data row numbers, one per sheet
    #[arg(long, default_value = "")]
    last_data_rows: String,

    /// Field name lists separated by ';', names within a list separated by ','
    #[arg(long, default_value = "")]
    field_names: String,

    /// Comma separated column ranges such as 4-6 or D-F, one per sheet
    #[arg(long, default_value = "")]
    data_columns: String,

    /// Rows per insert statement
    #[arg(long, default_value_t = 1000)]
    rows_per_batch: usize,

    /// Keep existing rows instead of truncating the table first
    #[arg(long)]
    append: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = LoaderConfig::new(&cli.schema, !cli.append, cli.rows_per_batch)
        .context("Invalid loader options")?;
    let workbook = open_workbook(&cli.file)
        .with_context(|| format!("Failed to read workbook '{}'", cli.file.display()))?;

    let sheet_names = match cli.sheets.trim() {
        "" => workbook
            .first_sheet_name()
            .context("Workbook has no sheets")?
            .to_owned(),
        sheets => sheets.to_owned(),
    };
    let properties = Properties {
        sheet_names,
        table_names: cli.tables,
        header_rows: cli.header_rows,
        first_data_rows: cli.first_data_rows,
        last_data_rows: cli.last_data_rows,
        field_names: cli.field_names,
        data_columns: cli.data_columns,
    };

    let sink = DuckDbSink::open(cli.database.as_deref())
        .context("Failed to open database")?;
    let mut loader = Loader::new(workbook, sink, config);
    let requests = properties
        .requests(loader.transliterator())
        .context("Invalid sheet properties")?;

    let summaries = loader.write_all(&requests).context("Load failed")?;
    for summary in summaries {
        info!(
            table = %summary.table,
            columns = summary.columns,
            rows = summary.rows_written,
            batches = summary.batches_written,
            "table loaded"
        );
    }
    Ok(())
}
