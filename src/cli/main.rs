//! csv-import: load every CSV file of a directory into a DuckDB database

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use csv_table_importer::{CsvImporter, ImportError, ImportSettings};

mod output;

#[derive(Parser, Debug)]
#[command(
    name = "csv-import",
    version,
    about = "Import a directory of CSV files into a database, one table per file"
)]
struct Cli {
    /// Settings file (JSON or TOML)
    #[arg(short, long, default_value = "appsettings.json")]
    config: PathBuf,

    /// Directory containing the CSV files (overrides the settings file)
    #[arg(long)]
    source: Option<PathBuf>,

    /// Database file, or :memory: (overrides the settings file)
    #[arg(long)]
    target: Option<String>,

    /// Search subdirectories (`--recursive=false` overrides the settings file)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    recursive: Option<bool>,

    /// Prefix table names with their directories (`=false` to turn off)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    include_directory: Option<bool>,

    /// Print the planned tables without touching the database
    #[arg(long, conflicts_with = "emit_sql")]
    dry_run: bool,

    /// Write a SQL script to this file instead of importing
    #[arg(long, value_name = "FILE")]
    emit_sql: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(error) = run(&cli) {
        match error.downcast_ref::<ImportError>() {
            Some(import_error) => {
                eprintln!("{}: {}", import_error.category(), import_error.user_message());
            }
            None => eprintln!("error: {error:#}"),
        }
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Settings file values, with command-line overrides applied
fn resolve_settings(cli: &Cli) -> Result<ImportSettings, ImportError> {
    let mut settings = if cli.config.exists() {
        ImportSettings::from_file(&cli.config)?
    } else if cli.source.is_some() && cli.target.is_some() {
        ImportSettings {
            source_directory: PathBuf::new(),
            connection_target: String::new(),
            recursive: false,
            include_directory_in_table_name: false,
        }
    } else {
        return Err(ImportError::Config(format!(
            "settings file {} not found; pass --source and --target instead",
            cli.config.display()
        )));
    };

    if let Some(source) = &cli.source {
        settings.source_directory = source.clone();
    }
    if let Some(target) = &cli.target {
        settings.connection_target = target.clone();
    }
    if let Some(recursive) = cli.recursive {
        settings.recursive = recursive;
    }
    if let Some(include) = cli.include_directory {
        settings.include_directory_in_table_name = include;
    }

    settings.validate()?;
    Ok(settings)
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let settings = resolve_settings(cli)?;
    tracing::info!(?settings, "Resolved settings");

    let mut importer = CsvImporter::new(settings);

    if cli.dry_run {
        let plan = importer.plan()?;
        print!("{}", output::format_plan(&plan));
        return Ok(());
    }

    if let Some(path) = &cli.emit_sql {
        let report = importer.write_sql_file(path)?;
        println!(
            "Wrote {} table(s) and {} row(s) to {}",
            report.files_processed(),
            report.rows_inserted(),
            path.display()
        );
        return Ok(());
    }

    let target = importer.settings().connection_target.clone();
    let report = importer.run()?;
    print!("{}", output::format_report(&report, &target));
    Ok(())
}
