//! Translation of a platform-neutral [`Document`] into the external wire
//! payloads.
//!
//! The two platforms disagree structurally: QuickBooks wants a discriminated
//! line array where `DetailType` selects an account-detail or item-detail
//! shape, Xero wants one flat line shape with no discriminant. Field names
//! and nesting below are the platforms' documented schemas and are part of
//! the contract.
//!
//! Translation is read-only over the document and either returns a complete
//! payload or a [`TranslateError`]; no partial payload is ever produced.

use crate::error::{TranslateError, TranslateResult};
use crate::models::{Address, Document, DocumentKind, LineItem, Platform};
use crate::resolve::ReferenceSet;
use crate::totals::aggregate;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fixed QuickBooks Accounts Payable account for bills.
const QB_AP_ACCOUNT: &str = "33";

const DETAIL_TYPE_ACCOUNT: &str = "AccountBasedExpenseLineDetail";
const DETAIL_TYPE_ITEM: &str = "ItemBasedExpenseLineDetail";

/// Fallback message when a remote fault carries no nested detail.
pub const GENERIC_FAULT_MESSAGE: &str = "An error occurred while saving the document";

// =============================================================================
// QuickBooks wire shapes
// =============================================================================

/// The `{ "value": ... }` wrapper QuickBooks uses for every reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefValue {
    pub value: String,
}

impl RefValue {
    fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickBooksPayload {
    #[serde(rename = "VendorRef", skip_serializing_if = "Option::is_none")]
    pub vendor_ref: Option<RefValue>,
    #[serde(rename = "CustomerRef", skip_serializing_if = "Option::is_none")]
    pub customer_ref: Option<RefValue>,
    #[serde(rename = "APAccountRef", skip_serializing_if = "Option::is_none")]
    pub ap_account_ref: Option<RefValue>,
    #[serde(rename = "TxnDate")]
    pub txn_date: NaiveDate,
    #[serde(rename = "DueDate")]
    pub due_date: NaiveDate,
    #[serde(rename = "PrivateNote", skip_serializing_if = "Option::is_none")]
    pub private_note: Option<String>,
    #[serde(rename = "Line")]
    pub line: Vec<QuickBooksLine>,
    #[serde(rename = "TotalAmt", with = "rust_decimal::serde::float")]
    pub total_amt: Decimal,
    #[serde(rename = "CurrencyRef")]
    pub currency_ref: RefValue,
}

/// One QuickBooks line; `DetailType` selects which detail object is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickBooksLine {
    #[serde(rename = "DetailType")]
    pub detail_type: String,
    #[serde(rename = "Amount", with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        rename = "AccountBasedExpenseLineDetail",
        skip_serializing_if = "Option::is_none"
    )]
    pub account_detail: Option<AccountBasedDetail>,
    #[serde(
        rename = "ItemBasedExpenseLineDetail",
        skip_serializing_if = "Option::is_none"
    )]
    pub item_detail: Option<ItemBasedDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountBasedDetail {
    #[serde(rename = "AccountRef")]
    pub account_ref: RefValue,
    #[serde(rename = "CustomerRef", skip_serializing_if = "Option::is_none")]
    pub customer_ref: Option<RefValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemBasedDetail {
    #[serde(rename = "ItemRef")]
    pub item_ref: RefValue,
    #[serde(rename = "Qty", with = "rust_decimal::serde::float")]
    pub qty: Decimal,
    #[serde(rename = "UnitPrice", with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(rename = "BillableStatus")]
    pub billable_status: String,
    #[serde(rename = "CustomerRef", skip_serializing_if = "Option::is_none")]
    pub customer_ref: Option<RefValue>,
}

// =============================================================================
// Xero wire shapes
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XeroPayload {
    pub invoice_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub status: String,
    pub currency_code: String,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub customer_id: String,
    pub customer_name: String,
    pub addresses: Vec<Address>,
    pub line_items: Vec<XeroLine>,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount_due: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount_paid: Decimal,
    pub line_amount_types: String,
}

/// One flat Xero line; the line-kind discriminant is intentionally dropped
/// because Xero's schema does not distinguish kinds structurally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XeroLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    pub description: String,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub quantity: Option<Decimal>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub rate: Option<Decimal>,
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub unit_amount: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub line_total: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_code: Option<String>,
}

/// A complete payload for one of the two platforms.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ExternalPayload {
    QuickBooks(QuickBooksPayload),
    Xero(XeroPayload),
}

// =============================================================================
// Translation
// =============================================================================

/// Build the external payload for `doc` on its platform.
///
/// Fails with [`TranslateError::EmptyDocument`] on a document without lines
/// and [`TranslateError::MissingReference`] when a line's mandatory account
/// or item reference is blank or does not resolve. Optional customer refs
/// that do not resolve are omitted rather than failing.
pub fn translate(doc: &Document, refs: &ReferenceSet) -> TranslateResult<ExternalPayload> {
    if doc.lines.is_empty() {
        return Err(TranslateError::EmptyDocument);
    }

    check_mandatory_references(doc, refs)?;

    match doc.platform {
        Platform::QuickBooks => Ok(ExternalPayload::QuickBooks(to_quickbooks(doc, refs))),
        Platform::Xero => Ok(ExternalPayload::Xero(to_xero(doc, refs))),
    }
}

/// Every line must carry a resolvable account (category) or item (item) ref.
fn check_mandatory_references(doc: &Document, refs: &ReferenceSet) -> TranslateResult<()> {
    for (index, line) in doc.lines.iter().enumerate() {
        match line {
            LineItem::Category { account_ref, .. } => {
                if account_ref.is_empty() || refs.resolve_account(account_ref).is_none() {
                    return Err(TranslateError::MissingReference { line: index, field: "accountRef" });
                }
            }
            LineItem::Item { item_ref, .. } => {
                if item_ref.is_empty() || refs.resolve_item(item_ref).is_none() {
                    return Err(TranslateError::MissingReference { line: index, field: "itemRef" });
                }
            }
        }
    }
    Ok(())
}

/// Optional customer ref: kept only when it resolves, omitted otherwise.
fn optional_customer_ref(line: &LineItem, refs: &ReferenceSet) -> Option<RefValue> {
    line.customer_ref()
        .filter(|id| refs.resolve_customer(id).is_some())
        .map(RefValue::new)
}

fn non_empty(s: &str) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

fn to_quickbooks(doc: &Document, refs: &ReferenceSet) -> QuickBooksPayload {
    let lines = doc
        .lines
        .iter()
        .map(|line| match line {
            LineItem::Category { account_ref, description, amount, .. } => QuickBooksLine {
                detail_type: DETAIL_TYPE_ACCOUNT.to_string(),
                amount: *amount,
                description: non_empty(description),
                account_detail: Some(AccountBasedDetail {
                    account_ref: RefValue::new(account_ref),
                    customer_ref: optional_customer_ref(line, refs),
                }),
                item_detail: None,
            },
            LineItem::Item { item_ref, description, quantity, rate, .. } => QuickBooksLine {
                detail_type: DETAIL_TYPE_ITEM.to_string(),
                amount: *quantity * *rate,
                description: non_empty(description),
                account_detail: None,
                item_detail: Some(ItemBasedDetail {
                    item_ref: RefValue::new(item_ref),
                    qty: *quantity,
                    unit_price: *rate,
                    billable_status: "NotBillable".to_string(),
                    customer_ref: optional_customer_ref(line, refs),
                }),
            },
        })
        .collect();

    let totals = aggregate(&doc.lines);
    let counterparty = RefValue::new(&doc.counterparty_ref);
    let (vendor_ref, customer_ref, ap_account_ref) = match doc.kind {
        DocumentKind::Bill => (Some(counterparty), None, Some(RefValue::new(QB_AP_ACCOUNT))),
        DocumentKind::Invoice => (None, Some(counterparty), None),
    };

    QuickBooksPayload {
        vendor_ref,
        customer_ref,
        ap_account_ref,
        txn_date: doc.date,
        due_date: doc.due_date,
        private_note: doc.private_note.clone(),
        line: lines,
        total_amt: totals.total,
        currency_ref: RefValue::new(&doc.currency_code),
    }
}

fn to_xero(doc: &Document, refs: &ReferenceSet) -> XeroPayload {
    let lines = doc
        .lines
        .iter()
        .map(|line| match line {
            LineItem::Category { account_ref, description, amount, .. } => XeroLine {
                product_id: None,
                description: description.clone(),
                quantity: None,
                rate: None,
                unit_amount: None,
                tax_amount: Decimal::ZERO,
                line_total: *amount,
                account_code: Some(account_ref.clone()),
            },
            LineItem::Item { item_ref, description, quantity, rate, .. } => {
                // Xero addresses products by their short code where one exists
                let product_id = refs
                    .resolve_item(item_ref)
                    .map(|p| p.code.clone().unwrap_or_else(|| p.external_id.clone()));
                XeroLine {
                    product_id,
                    description: description.clone(),
                    quantity: Some(*quantity),
                    rate: Some(*rate),
                    unit_amount: Some(*rate),
                    tax_amount: Decimal::ZERO,
                    line_total: *quantity * *rate,
                    account_code: None,
                }
            }
        })
        .collect();

    let totals = aggregate(&doc.lines);

    XeroPayload {
        invoice_number: doc.number.clone(),
        reference: doc.reference.clone(),
        status: doc.status.clone(),
        currency_code: doc.currency_code.clone(),
        invoice_date: doc.date,
        due_date: doc.due_date,
        customer_id: doc.counterparty_ref.clone(),
        customer_name: doc.counterparty_name.clone(),
        addresses: doc.addresses.clone(),
        line_items: lines,
        subtotal: totals.subtotal,
        tax_amount: Decimal::ZERO,
        total_amount: totals.total,
        amount_due: totals.total,
        amount_paid: Decimal::ZERO,
        line_amount_types: "Exclusive".to_string(),
    }
}

// =============================================================================
// Remote fault passthrough
// =============================================================================

/// Pull the nested detail message out of a platform fault body, if present.
///
/// The shape is `{ "Fault": { "Error": [ { "Detail": "..." } ] } }`.
pub fn extract_fault_detail(body: &Value) -> Option<String> {
    body.get("Fault")?
        .get("Error")?
        .get(0)?
        .get("Detail")?
        .as_str()
        .map(str::to_string)
}

/// The message to surface for a failed submission: the platform's own detail
/// verbatim when the fault carries one, a generic message otherwise.
pub fn fault_message(body: &Value) -> String {
    extract_fault_detail(body).unwrap_or_else(|| GENERIC_FAULT_MESSAGE.to_string())
}
