//! REST API types for the operator console.
//!
//! Import responses carry the rebuilt draft documents directly, so the
//! console can open them in the editor without another fetch.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::import::RowError;
use crate::models::Document;
use crate::pipeline::ImportOutcome;
use crate::resolve::ReferenceTables;
use crate::totals::DocumentTotals;

/// Response sent to the console after a CSV import run.
///
/// `status` is "ready" when every row validated and drafts were built,
/// "error" when validation blocked the import (the error report is in
/// `metadata.validation`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResponse {
    /// Unique job identifier
    pub job_id: String,

    /// Status: "ready" or "error"
    pub status: String,

    /// Draft documents, one per invoice group
    pub documents: Vec<Document>,

    /// Totals per document, same order as `documents`
    pub totals: Vec<DocumentTotals>,

    /// Metadata about the import run
    pub metadata: ResponseMetadata,
}

/// Metadata about the import run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    /// Number of draft documents built
    pub total_documents: usize,

    /// CSV info
    pub csv_info: CsvMetadata,

    /// Validation report
    pub validation: ValidationStats,
}

/// CSV file metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvMetadata {
    pub encoding: String,
    pub delimiter: String,
    pub row_count: usize,
    pub columns: Vec<String>,
}

/// Validation report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationStats {
    pub error_count: usize,
    pub errors: Vec<RowError>,
}

impl From<ImportOutcome> for ImportResponse {
    fn from(outcome: ImportOutcome) -> Self {
        let status = if outcome.is_clean() { "ready" } else { "error" };

        ImportResponse {
            job_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            metadata: ResponseMetadata {
                total_documents: outcome.documents.len(),
                csv_info: CsvMetadata {
                    encoding: outcome.csv_info.encoding,
                    delimiter: outcome.csv_info.delimiter.to_string(),
                    row_count: outcome.csv_info.row_count,
                    columns: outcome.csv_info.headers,
                },
                validation: ValidationStats {
                    error_count: outcome.errors.len(),
                    errors: outcome.errors,
                },
            },
            documents: outcome.documents,
            totals: outcome.totals,
        }
    }
}

/// Request body for the translate endpoint: a staged document plus the
/// reference tables it must resolve against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    pub document: Document,
    #[serde(default)]
    pub references: ReferenceTables,
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "documents": [],
        "totals": [],
        "metadata": {
            "totalDocuments": 0
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::CsvInfo;

    fn outcome(errors: Vec<RowError>) -> ImportOutcome {
        ImportOutcome {
            documents: Vec::new(),
            totals: Vec::new(),
            errors,
            csv_info: CsvInfo {
                encoding: "utf-8".to_string(),
                delimiter: ';',
                headers: vec!["InvoiceNumber".to_string()],
                row_count: 1,
            },
        }
    }

    #[test]
    fn test_clean_outcome_is_ready() {
        let resp = ImportResponse::from(outcome(Vec::new()));
        assert_eq!(resp.status, "ready");
        assert_eq!(resp.metadata.csv_info.delimiter, ";");
        assert_eq!(resp.metadata.validation.error_count, 0);
    }

    #[test]
    fn test_blocked_outcome_is_error() {
        let errors = vec![RowError { row: 2, message: "CustomerName is required.".to_string() }];
        let resp = ImportResponse::from(outcome(errors));
        assert_eq!(resp.status, "error");
        assert_eq!(resp.metadata.validation.error_count, 1);
        assert_eq!(resp.metadata.validation.errors[0].row, 2);
    }

    #[test]
    fn test_error_response_shape() {
        let v = error_response("No file provided");
        assert_eq!(v["status"], "error");
        assert_eq!(v["error"], "No file provided");
    }
}
