//! Gridscribe CLI - grid configuration reports
//!
//! # Main Commands
//!
//! ```bash
//! gridscribe report                          # Store → output/grid_config_report.xlsx
//! gridscribe collection ./collections        # Postman exports → output.xlsx
//! gridscribe serve                           # Start HTTP server (port 3000)
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! gridscribe transform --kind query          # Print normalized records as JSON
//! gridscribe normalize-grid grid.json        # Reduce one grid descriptor
//! ```

use clap::{Parser, Subcommand};
use gridscribe::{
    normalize_grid, open_store, run_collection_report, run_report_with_config, transform_records,
    RecordKind, ReportConfig, ReportSummary,
};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "gridscribe")]
#[command(about = "Generate grid configuration reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full report: store → normalized records → spreadsheet
    Report {
        /// Configuration store (.db/.sqlite, .json or .csv export)
        #[arg(short, long)]
        store: Option<PathBuf>,

        /// Spreadsheet to write
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Normalize the records of one kind and print them as JSON
    Transform {
        /// Record kind
        #[arg(short, long, value_enum)]
        kind: RecordKind,

        /// Configuration store (.db/.sqlite, .json or .csv export)
        #[arg(short, long)]
        store: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Reduce a grid descriptor file to columns and default sort
    NormalizeGrid {
        /// Grid JSON file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Report the list requests of every collection in a directory
    Collection {
        /// Directory holding *.json collection exports
        dir: PathBuf,

        /// Spreadsheet to write (default: <dir>/output.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// URL filter regex
        #[arg(short, long)]
        pattern: Option<String>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    // Reads .env (if present) before the environment
    let config = ReportConfig::from_env();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Report { store, output } => {
            cmd_report(config.with_store(store).with_output(output))
        }

        Commands::Transform {
            kind,
            store,
            output,
        } => cmd_transform(kind, &config.with_store(store), output.as_deref()),

        Commands::NormalizeGrid { input, output } => {
            cmd_normalize_grid(&input, output.as_deref())
        }

        Commands::Collection {
            dir,
            output,
            pattern,
        } => {
            let pattern = pattern.unwrap_or(config.collection_pattern);
            cmd_collection(&dir, &pattern, output.as_deref())
        }

        Commands::Serve { port } => {
            let mut config = config;
            if let Some(port) = port {
                config.port = port;
            }
            gridscribe::server::start_server(config).await
        }
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_report(config: ReportConfig) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Store: {}", config.store.display());

    let summary = run_report_with_config(&config)?;
    print_summary(&summary);

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_transform(
    kind: RecordKind,
    config: &ReportConfig,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Store: {}", config.store.display());

    let store = open_store(&config.store)?;
    let raw = store.fetch(kind)?;
    let records = transform_records(kind, &raw)?;

    eprintln!(
        "⚙️  Normalized {} {} records ({} with endpoint)",
        records.len(),
        kind,
        records.iter().filter(|r| r.url.is_some()).count()
    );

    let json = serde_json::to_string_pretty(&records)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_normalize_grid(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Grid: {}", input.display());

    let text = fs::read_to_string(input)?;
    let grid = normalize_grid(Some(&text))?;

    let mut merged = Map::new();
    grid.merge_into(&mut merged);

    match grid.columns {
        Some(ref columns) => eprintln!("   Columns kept: {}", columns.len()),
        None => eprintln!("   No column list"),
    }

    let json = serde_json::to_string_pretty(&json!({
        "grid": Value::Object(grid.grid),
        "dataSourceFields": Value::Object(merged),
    }))?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_collection(
    dir: &Path,
    pattern: &str,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Collections: {}", dir.display());
    eprintln!("   URL filter: {}", pattern);

    let summary = run_collection_report(dir, pattern, output)?;
    print_summary(&summary);

    eprintln!("\n✨ Done!");
    Ok(())
}

fn print_summary(summary: &ReportSummary) {
    eprintln!("\n📊 Sheets:");
    for sheet in &summary.sheets {
        eprintln!("   {:<32} {} rows", sheet.title, sheet.rows);
    }
    eprintln!("   💾 Saved to: {}", summary.output.display());
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
