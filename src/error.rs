//! Error types for the booksync core.
//!
//! - [`ImportError`] - CSV ingestion errors
//! - [`ResolveError`] - reference lookup and entry-time business rules
//! - [`TranslateError`] - payload translation errors
//! - [`PipelineError`] - top-level orchestration errors
//! - [`ServerError`] - HTTP surface errors
//!
//! Expected conditions (row errors, an unresolvable line reference) are
//! returned as structured values, never thrown; these enums cover the
//! unexpected and the per-call failures. Error conversion is automatic via
//! `From` implementations, so `?` works across boundaries.

use thiserror::Error;

// =============================================================================
// Import Errors
// =============================================================================

/// Errors while turning raw CSV bytes into import rows.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to decode file content.
    #[error("Failed to decode content as {0}")]
    Encoding(String),

    /// Malformed CSV.
    #[error("Invalid CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// A required column is absent from the header row.
    #[error("Missing required column: {0}")]
    MissingColumn(String),
}

// =============================================================================
// Resolve Errors
// =============================================================================

/// Entry-time reference errors raised by the editor flows.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// AP/AR accounts may not be booked against on a bill line.
    #[error("You cannot select {name} in a Bill")]
    RestrictedAccount { name: String },

    /// Account id not present in the reference table.
    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    /// Product id not present in the reference table.
    #[error("Unknown product: {0}")]
    UnknownProduct(String),
}

// =============================================================================
// Translate Errors
// =============================================================================

/// Errors while building an external payload from a document.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranslateError {
    /// A document must carry at least one line before submission.
    #[error("Document has no line items")]
    EmptyDocument,

    /// A line's mandatory account/item reference is absent or unresolvable.
    #[error("Line {line}: missing or unresolvable {field}")]
    MissingReference { line: usize, field: &'static str },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level orchestration errors.
///
/// This is the main error type returned by [`crate::pipeline::import_bytes`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV ingestion error.
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Translation error.
    #[error("Translate error: {0}")]
    Translate(#[from] TranslateError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV ingestion.
pub type ImportResult<T> = Result<T, ImportError>;

/// Result type for reference resolution.
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Result type for payload translation.
pub type TranslateResult<T> = Result<T, TranslateError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // ImportError -> PipelineError
        let import_err = ImportError::EmptyFile;
        let pipeline_err: PipelineError = import_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        // TranslateError -> PipelineError
        let translate_err = TranslateError::MissingReference { line: 2, field: "itemRef" };
        let pipeline_err: PipelineError = translate_err.into();
        assert!(pipeline_err.to_string().contains("itemRef"));
    }

    #[test]
    fn test_restricted_account_message_names_account() {
        let err = ResolveError::RestrictedAccount { name: "Accounts Payable (A/P)".into() };
        assert_eq!(err.to_string(), "You cannot select Accounts Payable (A/P) in a Bill");
    }
}
