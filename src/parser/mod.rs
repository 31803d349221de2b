//! CSV ingestion with encoding and delimiter auto-detection.
//!
//! Bulk-import files come from bookkeeping exports in assorted encodings, so
//! raw bytes are sniffed (chardet) and decoded (encoding_rs) before the `csv`
//! crate parses records. Every field stays a string: the row validator owns
//! all numeric and date interpretation.

use crate::error::{ImportError, ImportResult};
use crate::models::ImportRow;
use std::path::Path;

/// Column headers the import contract requires, in file order.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "InvoiceNumber",
    "CustomerName",
    "CustomerEmail",
    "InvoiceDate",
    "DueDate",
    "ItemName",
    "ItemDescription",
    "Quantity",
    "Rate",
];

/// Result of parsing with metadata.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed rows, one per CSV record after the header.
    pub rows: Vec<ImportRow>,
    /// Detected encoding.
    pub encoding: String,
    /// Detected delimiter.
    pub delimiter: char,
    /// Column headers as they appeared in the file.
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let (charset, _, _) = chardet::detect(bytes);

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        other => other.to_string(),
    }
}

/// Decode bytes to a string using the detected encoding.
pub fn decode_content(bytes: &[u8], encoding: &str) -> ImportResult<String> {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => Ok(String::from_utf8_lossy(bytes).to_string()),
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            Ok(encoding_rs::WINDOWS_1252.decode(bytes).0.to_string())
        }
        _ => {
            // Unknown charset: fall back to lossy UTF-8
            Ok(String::from_utf8_lossy(bytes).to_string())
        }
    }
}

/// Detect the delimiter by counting occurrences in the header line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> ImportResult<ParseResult> {
    if bytes.is_empty() {
        return Err(ImportError::EmptyFile);
    }

    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);

    parse_string(&content, delimiter, encoding)
}

/// Parse a CSV file with auto-detection of encoding and delimiter.
pub fn parse_file_auto<P: AsRef<Path>>(path: P) -> ImportResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// Parse decoded CSV content with an explicit delimiter.
pub fn parse_string(content: &str, delimiter: char, encoding: String) -> ImportResult<ParseResult> {
    if content.trim().is_empty() {
        return Err(ImportError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_matches('"').to_string())
        .collect();

    // Column positions per the contract header names
    let mut positions = [0usize; REQUIRED_COLUMNS.len()];
    for (i, name) in REQUIRED_COLUMNS.iter().enumerate() {
        positions[i] = headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ImportError::MissingColumn(name.to_string()))?;
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        let field = |i: usize| -> String {
            record
                .get(positions[i])
                .map(|s| s.trim().trim_matches('"').to_string())
                .unwrap_or_default()
        };

        rows.push(ImportRow {
            invoice_number: field(0),
            customer_name: field(1),
            customer_email: field(2),
            invoice_date: field(3),
            due_date: field(4),
            item_name: field(5),
            item_description: field(6),
            quantity: field(7),
            rate: field(8),
        });
    }

    Ok(ParseResult {
        rows,
        encoding,
        delimiter,
        headers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "InvoiceNumber,CustomerName,CustomerEmail,InvoiceDate,DueDate,ItemName,ItemDescription,Quantity,Rate";

    fn csv(body: &str) -> String {
        format!("{HEADER}\n{body}")
    }

    #[test]
    fn test_simple_csv() {
        let content = csv("1001,Acme,a@x.com,2024-01-01,2024-01-31,Widget,blue widget,2,5");
        let result = parse_bytes_auto(content.as_bytes()).unwrap();

        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.delimiter, ',');
        let row = &result.rows[0];
        assert_eq!(row.invoice_number, "1001");
        assert_eq!(row.customer_name, "Acme");
        assert_eq!(row.quantity, "2");
        assert_eq!(row.rate, "5");
    }

    #[test]
    fn test_values_stay_strings() {
        let content = csv("1001,Acme,,2024-01-01,2024-01-31,Widget,d,not-a-number,5.50");
        let result = parse_bytes_auto(content.as_bytes()).unwrap();

        // no coercion: the validator owns interpretation
        assert_eq!(result.rows[0].quantity, "not-a-number");
        assert_eq!(result.rows[0].rate, "5.50");
    }

    #[test]
    fn test_semicolon_delimiter_detected() {
        let content = csv("x").replace(',', ";");
        let result = parse_bytes_auto(content.as_bytes()).unwrap();
        assert_eq!(result.delimiter, ';');
    }

    #[test]
    fn test_reordered_columns() {
        let content = "Rate,InvoiceNumber,CustomerName,CustomerEmail,InvoiceDate,DueDate,ItemName,ItemDescription,Quantity\n\
                       5,1001,Acme,,2024-01-01,2024-01-31,Widget,d,2";
        let result = parse_bytes_auto(content.as_bytes()).unwrap();
        assert_eq!(result.rows[0].invoice_number, "1001");
        assert_eq!(result.rows[0].rate, "5");
    }

    #[test]
    fn test_missing_column_error() {
        let content = "InvoiceNumber,CustomerName\n1001,Acme";
        let err = parse_bytes_auto(content.as_bytes()).unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn(ref c) if c == "CustomerEmail"));
    }

    #[test]
    fn test_empty_file_error() {
        assert!(matches!(parse_bytes_auto(b""), Err(ImportError::EmptyFile)));
    }

    #[test]
    fn test_blank_lines_skipped() {
        let content = csv("1001,Acme,,2024-01-01,2024-01-31,Widget,d,2,5\n,,,,,,,,\n");
        let result = parse_bytes_auto(content.as_bytes()).unwrap();
        assert_eq!(result.rows.len(), 1);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1 as customer name
        let mut bytes = format!("{HEADER}\n1001,").into_bytes();
        bytes.extend_from_slice(&[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9]);
        bytes.extend_from_slice(b",,2024-01-01,2024-01-31,Widget,d,2,5");

        let result = parse_bytes_auto(&bytes).unwrap();
        assert!(result.rows[0].customer_name.contains("Soci"));
    }

    #[test]
    fn test_parse_file_auto() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", csv("1001,Acme,,2024-01-01,2024-01-31,Widget,d,2,5")).unwrap();

        let result = parse_file_auto(file.path()).unwrap();
        assert_eq!(result.rows.len(), 1);
    }
}
