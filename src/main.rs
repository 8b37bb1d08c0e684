use std::fs;
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use dbmlite::{GrammarConfig, parse_dbml};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    /// PostgreSQL DDL
    Sql,
    /// Normalized DBML
    Dbml,
}

#[derive(Parser, Debug)]
#[command(name = "dbmlite", version, about = "Compile DBML database models")]
struct Cli {
    /// Input .dbml file
    input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "sql")]
    format: Format,

    /// Accept arbitrary `key: 'value'` column settings
    #[arg(long)]
    allow_properties: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log parsing and resolution steps to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "dbmlite=debug" } else { "dbmlite=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let input = match fs::read_to_string(&cli.input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read {}: {}", cli.input.display(), e);
            process::exit(1);
        }
    };

    let config = GrammarConfig::line_oriented().with_properties(cli.allow_properties);
    let db = match parse_dbml(&input, &config) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };
    tracing::info!(tables = db.tables().len(), "compiled {}", cli.input.display());

    let rendered = match cli.format {
        Format::Sql => db.sql(),
        Format::Dbml => db.dbml(),
    };

    match cli.output {
        Some(path) => {
            if let Err(e) = fs::write(&path, &rendered) {
                eprintln!("Failed to write {}: {}", path.display(), e);
                process::exit(1);
            }
        }
        None => print!("{}", rendered),
    }
}
