//! High-level pipeline API for CSV to document import.
//!
//! This module combines all stages: parsing, validation, grouping, document
//! building and totals.
//!
//! # Example
//!
//! ```rust,ignore
//! use booksync::pipeline::{import_csv, ImportOptions};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let outcome = import_csv(Path::new("invoices.csv"), ImportOptions::default())?;
//!     println!("Imported {} documents", outcome.documents.len());
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::api::logs::{log_error, log_info, log_success, log_warning};
use crate::error::{ImportError, PipelineResult};
use crate::import::{
    documents_from_groups, group_rows, validate_rows, MissingIdPolicy, RowError,
};
use crate::models::{Document, Platform, Product};
use crate::parser::{parse_bytes_auto, parse_file_auto, ParseResult};
use crate::totals::{aggregate, DocumentTotals};

/// Options for the import pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOptions {
    /// Target platform for the documents being staged
    pub platform: Platform,

    /// How to treat rows with a blank InvoiceNumber
    #[serde(default)]
    pub missing_id_policy: MissingIdPolicy,

    /// Product table used to pre-resolve item names, may be empty
    #[serde(default)]
    pub products: Vec<Product>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            platform: Platform::QuickBooks,
            missing_id_policy: MissingIdPolicy::default(),
            products: Vec::new(),
        }
    }
}

/// Result of a complete import pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    /// Draft documents, one per invoice group, in first-seen order
    pub documents: Vec<Document>,

    /// Totals for each document, same order as `documents`
    pub totals: Vec<DocumentTotals>,

    /// Row-level validation errors; non-empty means no documents were built
    pub errors: Vec<RowError>,

    /// CSV parsing metadata
    pub csv_info: CsvInfo,
}

impl ImportOutcome {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// CSV file information
#[derive(Debug, Clone, Serialize)]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Import a CSV file into draft documents.
///
/// This is the main entry point for the pipeline. It:
/// 1. Parses the CSV with encoding/delimiter auto-detection
/// 2. Validates every row against the bulk-import rules
/// 3. Groups rows by InvoiceNumber (first-seen order)
/// 4. Builds one draft document per group and aggregates its totals
///
/// Validation is all-or-nothing: any row error blocks document building and
/// the outcome carries the full error report instead.
pub fn import_csv(path: &Path, options: ImportOptions) -> PipelineResult<ImportOutcome> {
    let parse_result = parse_file_auto(path)?;
    import_parsed(parse_result, options)
}

/// Import CSV bytes into draft documents.
///
/// Same as `import_csv` but accepts raw bytes instead of a file path.
pub fn import_bytes(bytes: &[u8], options: ImportOptions) -> PipelineResult<ImportOutcome> {
    let parse_result = parse_bytes_auto(bytes)?;
    import_parsed(parse_result, options)
}

/// Internal: run the validate/group/build stages on parsed CSV data
fn import_parsed(parse_result: ParseResult, options: ImportOptions) -> PipelineResult<ImportOutcome> {
    log_info("Reading CSV...");
    log_success(format!("Detected encoding: {}", parse_result.encoding));
    log_success(format!(
        "Detected separator: '{}'",
        format_delimiter(parse_result.delimiter)
    ));
    log_success(format!("Read {} rows", parse_result.rows.len()));

    let csv_info = CsvInfo {
        encoding: parse_result.encoding.clone(),
        delimiter: parse_result.delimiter,
        headers: parse_result.headers.clone(),
        row_count: parse_result.rows.len(),
    };

    if parse_result.rows.is_empty() {
        return Err(ImportError::EmptyFile.into());
    }

    log_info("Validating rows...");
    let validation = validate_rows(&parse_result.rows, options.missing_id_policy);
    if !validation.is_clean() {
        log_error(format!("{} validation error(s), import blocked", validation.errors.len()));
        for err in validation.errors.iter().take(5) {
            log_error(format!("Row {}: {}", err.row, err.message));
        }
        if validation.errors.len() > 5 {
            log_warning(format!("... and {} more", validation.errors.len() - 5));
        }
        return Ok(ImportOutcome {
            documents: Vec::new(),
            totals: Vec::new(),
            errors: validation.errors,
            csv_info,
        });
    }
    log_success("All rows valid");

    log_info("Grouping by InvoiceNumber...");
    let groups = group_rows(&parse_result.rows);
    log_success(format!("{} invoice group(s)", groups.len()));

    let documents = documents_from_groups(&groups, options.platform, &options.products);
    let totals: Vec<DocumentTotals> = documents.iter().map(|d| aggregate(&d.lines)).collect();
    log_success(format!("Built {} draft document(s)", documents.len()));

    Ok(ImportOutcome { documents, totals, errors: Vec::new(), csv_info })
}

/// Format delimiter for display
fn format_delimiter(d: char) -> &'static str {
    match d {
        ';' => ";",
        ',' => ",",
        '\t' => "TAB",
        '|' => "|",
        _ => "?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAN_CSV: &str = "\
InvoiceNumber,CustomerName,CustomerEmail,InvoiceDate,DueDate,ItemName,ItemDescription,Quantity,Rate
1001,Acme,billing@acme.com,2024-01-01,2024-01-31,Widget,Standard widget,2,5
1001,Acme,billing@acme.com,2024-01-01,2024-01-31,Gadget,Deluxe gadget,1,30
1002,Globex,ap@globex.com,2024-01-02,2024-02-01,Widget,Standard widget,4,5
";

    #[test]
    fn test_clean_import_builds_documents() {
        let outcome = import_bytes(CLEAN_CSV.as_bytes(), ImportOptions::default()).unwrap();
        assert!(outcome.is_clean());
        assert_eq!(outcome.documents.len(), 2);
        assert_eq!(outcome.documents[0].number, "1001");
        assert_eq!(outcome.documents[0].lines.len(), 2);
        assert_eq!(outcome.totals[0].total.to_string(), "40");
        assert_eq!(outcome.totals[1].total.to_string(), "20");
        assert_eq!(outcome.csv_info.row_count, 3);
        assert_eq!(outcome.csv_info.delimiter, ',');
    }

    #[test]
    fn test_row_error_blocks_all_documents() {
        let csv = CLEAN_CSV.replace("ap@globex.com", "not-an-email");
        let outcome = import_bytes(csv.as_bytes(), ImportOptions::default()).unwrap();
        assert!(!outcome.is_clean());
        assert!(outcome.documents.is_empty());
        assert!(outcome.totals.is_empty());
        assert_eq!(outcome.errors[0].row, 4);
        assert_eq!(outcome.errors[0].message, "Invalid email format.");
    }

    #[test]
    fn test_empty_file_is_an_error() {
        let csv = "InvoiceNumber,CustomerName,CustomerEmail,InvoiceDate,DueDate,ItemName,ItemDescription,Quantity,Rate\n";
        assert!(import_bytes(csv.as_bytes(), ImportOptions::default()).is_err());
    }

    #[test]
    fn test_default_options() {
        let opts = ImportOptions::default();
        assert_eq!(opts.platform, Platform::QuickBooks);
        assert_eq!(opts.missing_id_policy, MissingIdPolicy::Skip);
        assert!(opts.products.is_empty());
    }
}
