//! Booksync CLI - stage accounting documents for QuickBooks and Xero
//!
//! # Main Commands
//!
//! ```bash
//! booksync serve                      # Start HTTP server (port 3000)
//! booksync import invoices.csv       # Validate CSV and build draft documents
//! booksync translate doc.json        # Build the external wire payload
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! booksync parse invoices.csv        # Just parse CSV to JSON rows
//! booksync validate invoices.csv     # Run the row validator only
//! booksync totals doc.json           # Aggregate a document's totals
//! ```

use clap::{Parser, Subcommand};
use booksync::{
    aggregate, format_currency, import_csv, parse_file_auto, translate, validate_rows,
    Document, ImportOptions, MissingIdPolicy, Platform, ReferenceTables,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "booksync")]
#[command(about = "Stage invoices and bills for QuickBooks and Xero", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV file and output JSON rows
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run the bulk-import row validator and print the error report
    Validate {
        /// Input CSV file
        input: PathBuf,

        /// Report rows with a blank InvoiceNumber instead of skipping them
        #[arg(long)]
        report_missing_ids: bool,
    },

    /// Full import pipeline: CSV -> validated draft documents
    Import {
        /// Input CSV file
        input: PathBuf,

        /// Target platform: quickbooks or xero
        #[arg(short, long, default_value = "quickbooks")]
        platform: String,

        /// Reference tables JSON file (accounts/products/customers)
        #[arg(short, long)]
        refs: Option<PathBuf>,

        /// Report rows with a blank InvoiceNumber instead of skipping them
        #[arg(long)]
        report_missing_ids: bool,

        /// Output file for the draft documents (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build the external wire payload for a staged document
    Translate {
        /// Document JSON file
        input: PathBuf,

        /// Override the document's platform: quickbooks or xero
        #[arg(short, long)]
        platform: Option<String>,

        /// Reference tables JSON file (accounts/products/customers)
        #[arg(short, long)]
        refs: Option<PathBuf>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Aggregate a document's totals
    Totals {
        /// Document JSON file
        input: PathBuf,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse { input, output } => cmd_parse(&input, output.as_deref()),

        Commands::Validate { input, report_missing_ids } => {
            cmd_validate(&input, report_missing_ids)
        }

        Commands::Import { input, platform, refs, report_missing_ids, output } => {
            cmd_import(&input, &platform, refs.as_deref(), report_missing_ids, output.as_deref())
        }

        Commands::Translate { input, platform, refs, output } => {
            cmd_translate(&input, platform.as_deref(), refs.as_deref(), output.as_deref())
        }

        Commands::Totals { input } => cmd_totals(&input),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_parse(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Parsing CSV: {}", input.display());

    let result = parse_file_auto(input)?;

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(result.delimiter));
    eprintln!("   Columns: {}", result.headers.join(", "));
    eprintln!("Parsed {} rows", result.rows.len());

    let json = serde_json::to_string_pretty(&result.rows)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_validate(input: &Path, report_missing_ids: bool) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Validating: {}", input.display());

    let result = parse_file_auto(input)?;
    let policy = missing_id_policy(report_missing_ids);
    let validation = validate_rows(&result.rows, policy);

    if validation.is_clean() {
        eprintln!("All {} rows valid", result.rows.len());
        return Ok(());
    }

    eprintln!("{} error(s):", validation.errors.len());
    for err in &validation.errors {
        eprintln!("   Row {}: {}", err.row, err.message);
    }
    std::process::exit(1);
}

fn cmd_import(
    input: &Path,
    platform: &str,
    refs: Option<&Path>,
    report_missing_ids: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Processing: {}", input.display());

    let platform = parse_platform(platform)?;
    let tables = load_refs(refs)?;
    let options = ImportOptions {
        platform,
        missing_id_policy: missing_id_policy(report_missing_ids),
        products: tables.products,
    };

    let outcome = import_csv(input, options)?;

    eprintln!("   Encoding: {}", outcome.csv_info.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(outcome.csv_info.delimiter));
    eprintln!("   Rows: {}", outcome.csv_info.row_count);

    if !outcome.is_clean() {
        eprintln!("\n{} validation error(s), no documents built:", outcome.errors.len());
        for err in &outcome.errors {
            eprintln!("   Row {}: {}", err.row, err.message);
        }
        std::process::exit(1);
    }

    eprintln!("\nBuilt {} draft document(s):", outcome.documents.len());
    for (doc, totals) in outcome.documents.iter().zip(&outcome.totals) {
        eprintln!(
            "   {} - {} ({} lines, total {})",
            doc.number,
            doc.counterparty_name,
            doc.lines.len(),
            format_currency(totals.total)
        );
    }

    let json = serde_json::to_string_pretty(&outcome.documents)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_translate(
    input: &Path,
    platform: Option<&str>,
    refs: Option<&Path>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Translating: {}", input.display());

    let content = fs::read_to_string(input)?;
    let mut document: Document = serde_json::from_str(&content)?;
    if let Some(p) = platform {
        document.platform = parse_platform(p)?;
    }
    let tables = load_refs(refs)?;

    let payload = translate(&document, &tables.as_set())?;

    eprintln!("   Platform: {:?}", document.platform);
    eprintln!("   Lines: {}", document.lines.len());

    let json = serde_json::to_string_pretty(&payload)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_totals(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let content = fs::read_to_string(input)?;
    let document: Document = serde_json::from_str(&content)?;

    let totals = aggregate(&document.lines);
    println!("Subtotal: {}", format_currency(totals.subtotal));
    println!("Total:    {}", format_currency(totals.total));

    Ok(())
}

async fn cmd_serve(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    booksync::server::start_server(port).await
}

fn parse_platform(value: &str) -> Result<Platform, Box<dyn std::error::Error>> {
    Platform::from_str_opt(value).ok_or_else(|| format!("Unknown platform: {}", value).into())
}

fn missing_id_policy(report: bool) -> MissingIdPolicy {
    if report {
        MissingIdPolicy::Report
    } else {
        MissingIdPolicy::Skip
    }
}

fn load_refs(path: Option<&Path>) -> Result<ReferenceTables, Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            let content = fs::read_to_string(p)?;
            Ok(serde_json::from_str(&content)?)
        }
        None => Ok(ReferenceTables::default()),
    }
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("Saved to: {}", p.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}
