//! # Booksync - accounting document import and sync core
//!
//! Booksync stages invoices and bills for QuickBooks and Xero: it validates
//! bulk-import CSVs, rebuilds multi-line draft documents from flat rows,
//! resolves account/product/customer references, and builds each platform's
//! wire payload.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   CSV File  │────▶│   Parser    │────▶│  Validate   │────▶│  Documents  │
//! │ (UTF8/1252) │     │ (auto-enc)  │     │  + Group    │     │  (drafts)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └──────┬──────┘
//!                                                                    │
//!                                         ┌─────────────┐     ┌──────▼──────┐
//!                                         │  QB / Xero  │◀────│  Translate  │
//!                                         │  payloads   │     │ (+ resolve) │
//!                                         └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use booksync::pipeline::{import_csv, ImportOptions};
//!
//! fn main() {
//!     let outcome = import_csv("invoices.csv".as_ref(), ImportOptions::default()).unwrap();
//!     println!("Imported {} documents", outcome.documents.len());
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (Document, LineItem, reference tables)
//! - [`parser`] - CSV parsing with auto-detection
//! - [`import`] - Row validation, grouping and document reconstruction
//! - [`totals`] - Line aggregation
//! - [`resolve`] - Reference resolution and entry-time rules
//! - [`translate`] - Platform payload translation
//! - [`pipeline`] - End-to-end import orchestration
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Import pipeline
pub mod import;
pub mod pipeline;
pub mod totals;

// Resolution and translation
pub mod resolve;
pub mod translate;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ImportError, PipelineError, ResolveError, ServerError, TranslateError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    derive_product_flags, Account, Address, Customer, Document, DocumentKind, ImportRow,
    LineItem, Platform, Product, ProductFlags, ProductType, Vendor,
};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes_auto, parse_file_auto,
    parse_string, ParseResult, REQUIRED_COLUMNS,
};

// =============================================================================
// Re-exports - Import
// =============================================================================

pub use import::{
    document_from_group, documents_from_groups, group_rows, validate_rows, DocumentGroup,
    GroupedRow, MissingIdPolicy, RowError, ValidationResult,
};

// =============================================================================
// Re-exports - Totals
// =============================================================================

pub use totals::{aggregate, format_currency, DocumentTotals};

// =============================================================================
// Re-exports - Resolution
// =============================================================================

pub use resolve::{
    apply_account_to_line, apply_product_to_line, check_bill_account, ReferenceSet,
    ReferenceTables,
};

// =============================================================================
// Re-exports - Translation
// =============================================================================

pub use translate::{
    extract_fault_detail, fault_message, translate, ExternalPayload, QuickBooksPayload,
    XeroPayload, GENERIC_FAULT_MESSAGE,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use pipeline::{import_bytes, import_csv, CsvInfo, ImportOptions, ImportOutcome};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{
    error_response, CsvMetadata, ImportResponse, ResponseMetadata, TranslateRequest,
    ValidationStats,
};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
