//! Bulk-import row validation and document reconstruction.
//!
//! A bulk-import CSV carries one row per invoice line; rows sharing an
//! `InvoiceNumber` form one logical invoice. This module groups the flat rows,
//! checks every row independently, enforces per-group header consistency and
//! item-name uniqueness, and (for clean imports) rebuilds one [`Document`]
//! per group.
//!
//! ```text
//! CSV input (flat rows)                 Grouped output
//! ┌──────────────────────────────┐      ┌─────────────────────────┐
//! │ Inv: 1001, Item: Widget      │      │ Invoice 1001            │
//! │ Inv: 1001, Item: Gadget      │  →   │ Lines: [Widget, Gadget] │
//! │ Inv: 1002, Item: Widget      │      ├─────────────────────────┤
//! └──────────────────────────────┘      │ Invoice 1002            │
//!                                       │ Lines: [Widget]         │
//!                                       └─────────────────────────┘
//! ```
//!
//! Validation never fails as a call: all problems come back as
//! [`RowError`]s, one row may contribute several, and an empty error list
//! means the import is ready to submit. Report indices are 1-based file line
//! numbers, so row 0 of the slice reports as row 2 (header row counted).

use crate::models::{Document, ImportRow, LineItem, Platform, Product};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));

/// What to do with rows whose `InvoiceNumber` is blank.
///
/// Either way the row is excluded from grouping, so one unidentifiable row
/// cannot drag header-consistency noise into a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingIdPolicy {
    /// Drop blank-id rows silently (the historical import behavior).
    #[default]
    Skip,
    /// Report each blank-id row as an error.
    Report,
}

/// One validation finding, addressed by file line number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

impl RowError {
    fn new(row: usize, message: impl Into<String>) -> Self {
        Self { row, message: message.into() }
    }
}

/// The outcome of validating one import run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub errors: Vec<RowError>,
}

impl ValidationResult {
    /// True when the import may proceed to submission.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A row together with its 1-based file line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedRow {
    pub row: usize,
    pub data: ImportRow,
}

/// All rows sharing one invoice number, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentGroup {
    pub invoice_number: String,
    pub rows: Vec<GroupedRow>,
}

/// Partition rows into invoice groups, preserving first-seen group order and
/// row order within each group. Rows with a blank invoice number are dropped.
pub fn group_rows(rows: &[ImportRow]) -> Vec<DocumentGroup> {
    let mut groups: Vec<DocumentGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (i, row) in rows.iter().enumerate() {
        let id = row.invoice_number.trim();
        if id.is_empty() {
            continue;
        }
        let slot = *index.entry(id.to_string()).or_insert_with(|| {
            groups.push(DocumentGroup {
                invoice_number: id.to_string(),
                rows: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].rows.push(GroupedRow {
            row: report_row(i),
            data: row.clone(),
        });
    }

    groups
}

/// 1-based file line number for a slice index (header row counted).
fn report_row(index: usize) -> usize {
    index + 2
}

/// Validate a full import run.
///
/// Checks each row independently, then header consistency against the first
/// row of its group and item-name uniqueness within the group. Mismatches are
/// reported against the offending row, not the reference row. Deterministic:
/// group order is first-seen, row order is file order.
pub fn validate_rows(rows: &[ImportRow], policy: MissingIdPolicy) -> ValidationResult {
    let mut errors = Vec::new();

    if policy == MissingIdPolicy::Report {
        for (i, row) in rows.iter().enumerate() {
            if row.invoice_number.trim().is_empty() {
                errors.push(RowError::new(report_row(i), "InvoiceNumber is required."));
            }
        }
    }

    for group in group_rows(rows) {
        let first = &group.rows[0].data;
        let mut item_names: HashSet<String> = HashSet::new();

        for GroupedRow { row, data } in &group.rows {
            let row = *row;

            if data.customer_name.is_empty() {
                errors.push(RowError::new(row, "CustomerName is required."));
            }

            if !data.customer_email.is_empty() && !EMAIL_RE.is_match(&data.customer_email) {
                errors.push(RowError::new(row, "Invalid email format."));
            }

            if parse_date(&data.invoice_date).is_none() {
                errors.push(RowError::new(row, "Invalid InvoiceDate."));
            }

            if parse_date(&data.due_date).is_none() {
                errors.push(RowError::new(row, "Invalid DueDate."));
            }

            if data.item_name.is_empty() {
                errors.push(RowError::new(row, "ItemName is required."));
            }

            if data.item_description.is_empty() {
                errors.push(RowError::new(row, "ItemDescription is required."));
            }

            match parse_decimal(&data.quantity) {
                Some(q) if q > Decimal::ZERO => {}
                _ => errors.push(RowError::new(row, "Quantity must be a positive number.")),
            }

            match parse_decimal(&data.rate) {
                Some(r) if r >= Decimal::ZERO => {}
                _ => errors.push(RowError::new(row, "Rate must be a non-negative number.")),
            }

            if data.customer_name != first.customer_name
                || data.customer_email != first.customer_email
                || data.invoice_date != first.invoice_date
                || data.due_date != first.due_date
            {
                errors.push(RowError::new(
                    row,
                    "Inconsistent invoice header fields within the same InvoiceNumber group.",
                ));
            }

            let item_key = data.item_name.trim().to_lowercase();
            if !item_key.is_empty() && !item_names.insert(item_key) {
                errors.push(RowError::new(
                    row,
                    format!(
                        "Duplicate ItemName \"{}\" in Invoice {}.",
                        data.item_name, group.invoice_number
                    ),
                ));
            }
        }
    }

    ValidationResult { errors }
}

/// Parse a calendar date in the formats the import contract accepts.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%m/%d/%Y"))
        .ok()
}

fn parse_decimal(value: &str) -> Option<Decimal> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    value.parse().ok()
}

/// Rebuild one invoice [`Document`] from a validated group.
///
/// Returns `None` when the group's header dates do not parse; intended for
/// groups that already passed [`validate_rows`]. Item lines are matched
/// against the product table by name (trimmed, case-insensitive) where a
/// table is supplied; unmatched lines keep an empty item ref for the operator
/// to resolve in the editor.
pub fn document_from_group(
    group: &DocumentGroup,
    platform: Platform,
    products: &[Product],
) -> Option<Document> {
    let first = &group.rows.first()?.data;
    let date = parse_date(&first.invoice_date)?;
    let due_date = parse_date(&first.due_date)?;

    let mut doc = Document::invoice(platform, "", first.customer_name.clone(), date, due_date);
    doc.number = group.invoice_number.clone();
    if !first.customer_email.is_empty() {
        doc.counterparty_email = Some(first.customer_email.clone());
    }

    for GroupedRow { data, .. } in &group.rows {
        let quantity = parse_decimal(&data.quantity).unwrap_or(Decimal::ZERO);
        let rate = parse_decimal(&data.rate).unwrap_or(Decimal::ZERO);
        let item_ref = find_product_by_name(products, &data.item_name)
            .map(|p| p.external_id.clone())
            .unwrap_or_default();
        doc.push_line(LineItem::item(item_ref, data.item_description.clone(), quantity, rate));
    }

    Some(doc)
}

/// Rebuild documents for every group that yields one.
pub fn documents_from_groups(
    groups: &[DocumentGroup],
    platform: Platform,
    products: &[Product],
) -> Vec<Document> {
    groups
        .iter()
        .filter_map(|g| document_from_group(g, platform, products))
        .collect()
}

fn find_product_by_name<'a>(products: &'a [Product], name: &str) -> Option<&'a Product> {
    let key = name.trim().to_lowercase();
    products.iter().find(|p| p.name.trim().to_lowercase() == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(inv: &str, item: &str) -> ImportRow {
        ImportRow {
            invoice_number: inv.to_string(),
            customer_name: "Acme".to_string(),
            customer_email: "a@x.com".to_string(),
            invoice_date: "2024-01-01".to_string(),
            due_date: "2024-01-31".to_string(),
            item_name: item.to_string(),
            item_description: "d".to_string(),
            quantity: "2".to_string(),
            rate: "5".to_string(),
        }
    }

    #[test]
    fn test_clean_rows_produce_no_errors() {
        let rows = vec![row("1001", "Widget"), row("1001", "Gadget"), row("1002", "Widget")];
        let result = validate_rows(&rows, MissingIdPolicy::Skip);
        assert!(result.is_clean(), "{:?}", result.errors);
    }

    #[test]
    fn test_duplicate_item_reported_on_second_row() {
        let rows = vec![row("1001", "Widget"), row("1001", "Widget")];
        let result = validate_rows(&rows, MissingIdPolicy::Skip);

        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].row, 3);
        assert_eq!(
            result.errors[0].message,
            "Duplicate ItemName \"Widget\" in Invoice 1001."
        );
    }

    #[test]
    fn test_duplicate_detection_is_trimmed_and_case_insensitive() {
        let mut second = row("1001", "  WIDGET ");
        second.quantity = "1".to_string();
        let rows = vec![row("1001", "Widget"), second];
        let result = validate_rows(&rows, MissingIdPolicy::Skip);

        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.starts_with("Duplicate ItemName"));
    }

    #[test]
    fn test_header_mismatch_reported_against_mismatching_row() {
        let mut second = row("1001", "Gadget");
        second.customer_name = "Acme Inc".to_string();
        let rows = vec![row("1001", "Widget"), second];
        let result = validate_rows(&rows, MissingIdPolicy::Skip);

        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].row, 3);
        assert_eq!(
            result.errors[0].message,
            "Inconsistent invoice header fields within the same InvoiceNumber group."
        );
    }

    #[test]
    fn test_one_row_can_contribute_multiple_errors() {
        let mut bad = row("1001", "");
        bad.customer_name = String::new();
        bad.quantity = "-1".to_string();
        bad.item_description = String::new();
        let result = validate_rows(&[bad], MissingIdPolicy::Skip);

        let messages: Vec<&str> = result.errors.iter().map(|e| e.message.as_str()).collect();
        assert!(messages.contains(&"CustomerName is required."));
        assert!(messages.contains(&"ItemName is required."));
        assert!(messages.contains(&"ItemDescription is required."));
        assert!(messages.contains(&"Quantity must be a positive number."));
        assert!(result.errors.iter().all(|e| e.row == 2));
    }

    #[test]
    fn test_empty_email_is_allowed_invalid_email_is_not() {
        let mut no_email = row("1001", "Widget");
        no_email.customer_email = String::new();
        assert!(validate_rows(&[no_email], MissingIdPolicy::Skip).is_clean());

        let mut bad_email = row("1001", "Widget");
        bad_email.customer_email = "not-an-email".to_string();
        let result = validate_rows(&[bad_email], MissingIdPolicy::Skip);
        assert_eq!(result.errors[0].message, "Invalid email format.");
    }

    #[test]
    fn test_zero_rate_allowed_zero_quantity_not() {
        let mut r = row("1001", "Widget");
        r.rate = "0".to_string();
        r.quantity = "0".to_string();
        let result = validate_rows(&[r], MissingIdPolicy::Skip);

        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].message, "Quantity must be a positive number.");
    }

    #[test]
    fn test_invalid_dates_reported() {
        let mut r = row("1001", "Widget");
        r.invoice_date = "not-a-date".to_string();
        r.due_date = "2024-13-45".to_string();
        let result = validate_rows(&[r], MissingIdPolicy::Skip);

        let messages: Vec<&str> = result.errors.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["Invalid InvoiceDate.", "Invalid DueDate."]);
    }

    #[test]
    fn test_us_date_format_accepted() {
        let mut r = row("1001", "Widget");
        r.invoice_date = "01/15/2024".to_string();
        assert!(validate_rows(&[r], MissingIdPolicy::Skip).is_clean());
    }

    #[test]
    fn test_missing_id_skip_vs_report() {
        let mut blank = row("", "Widget");
        blank.invoice_number = String::new();

        let skip = validate_rows(&[blank.clone()], MissingIdPolicy::Skip);
        assert!(skip.is_clean());

        let report = validate_rows(&[blank], MissingIdPolicy::Report);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].message, "InvoiceNumber is required.");
    }

    #[test]
    fn test_validation_is_deterministic() {
        let rows = vec![
            row("1002", "Widget"),
            row("1001", "Widget"),
            row("1001", "Widget"),
            row("1002", "Gadget"),
        ];
        let a = validate_rows(&rows, MissingIdPolicy::Skip);
        let b = validate_rows(&rows, MissingIdPolicy::Skip);
        assert_eq!(a.errors, b.errors);
    }

    #[test]
    fn test_grouping_preserves_first_seen_order() {
        let rows = vec![row("1002", "A"), row("1001", "B"), row("1002", "C")];
        let groups = group_rows(&rows);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].invoice_number, "1002");
        assert_eq!(groups[0].rows.len(), 2);
        assert_eq!(groups[0].rows[0].row, 2);
        assert_eq!(groups[0].rows[1].row, 4);
        assert_eq!(groups[1].invoice_number, "1001");
    }

    #[test]
    fn test_document_from_group() {
        let rows = vec![row("1001", "Widget"), row("1001", "Gadget")];
        let groups = group_rows(&rows);
        let products = vec![Product {
            external_id: "7".to_string(),
            code: None,
            name: "widget".to_string(),
            description: String::new(),
            sales_unit_price: "5".parse().unwrap(),
            active: true,
        }];

        let doc = document_from_group(&groups[0], Platform::QuickBooks, &products).unwrap();
        assert_eq!(doc.number, "1001");
        assert_eq!(doc.counterparty_name, "Acme");
        assert_eq!(doc.counterparty_email.as_deref(), Some("a@x.com"));
        assert_eq!(doc.lines.len(), 2);
        // "Widget" matched the product table by name, "Gadget" did not
        match (&doc.lines[0], &doc.lines[1]) {
            (
                LineItem::Item { item_ref: first, .. },
                LineItem::Item { item_ref: second, .. },
            ) => {
                assert_eq!(first, "7");
                assert_eq!(second, "");
            }
            other => panic!("expected item lines, got {other:?}"),
        }
        assert_eq!(doc.lines[0].amount(), "10".parse().unwrap());
    }

    #[test]
    fn test_document_from_group_requires_parsable_dates() {
        let mut bad = row("1001", "Widget");
        bad.invoice_date = "garbage".to_string();
        let groups = group_rows(&[bad]);
        assert!(document_from_group(&groups[0], Platform::Xero, &[]).is_none());
    }
}
