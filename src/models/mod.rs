//! Domain models shared across the import and translation pipeline:
//!
//! - [`Platform`] / [`DocumentKind`] - discriminators for the two bookkeeping
//!   systems and the two document kinds
//! - [`ImportRow`] - one flat CSV record, string-typed fields only
//! - [`LineItem`] - the tagged union of category-based and item-based lines
//! - [`Document`] - an invoice or bill under edit, header + ordered lines
//! - [`Account`], [`Product`], [`Customer`], [`Vendor`] - reference tables
//!   owned by the external service layer, read-only here
//! - [`derive_product_flags`] - the sold/purchased/inventory toggle rules

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Platform & Document Kind
// =============================================================================

/// One of the two connected bookkeeping platforms.
///
/// The two have incompatible wire schemas: QuickBooks lines carry a
/// `DetailType` discriminant, Xero lines are a single flat shape.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    QuickBooks,
    Xero,
}

impl Platform {
    /// Parse a platform from a CLI/API string ("quickbooks" or "xero").
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "quickbooks" | "qb" | "qbo" => Some(Self::QuickBooks),
            "xero" => Some(Self::Xero),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QuickBooks => "quickbooks",
            Self::Xero => "xero",
        }
    }
}

/// Whether a document is money-in (invoice) or money-out (bill).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Invoice,
    Bill,
}

// =============================================================================
// Import Row
// =============================================================================

/// One flat record from a bulk-import CSV.
///
/// All fields are kept as raw strings: the upstream parser does no type
/// coercion, and the row validator owns numeric and date interpretation.
/// Rows have no identity beyond their position in the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ImportRow {
    pub invoice_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub invoice_date: String,
    pub due_date: String,
    pub item_name: String,
    pub item_description: String,
    pub quantity: String,
    pub rate: String,
}

// =============================================================================
// Line Items
// =============================================================================

/// A single line of a document.
///
/// Category lines book an amount against an expense account; item lines book
/// `quantity * rate` against a product. The two kinds carry only the fields
/// valid for their kind, so states like an item line with an account ref
/// cannot be represented.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum LineItem {
    #[serde(rename_all = "camelCase")]
    Category {
        account_ref: String,
        description: String,
        #[serde(with = "rust_decimal::serde::float")]
        amount: Decimal,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        customer_ref: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Item {
        item_ref: String,
        description: String,
        #[serde(with = "rust_decimal::serde::float")]
        quantity: Decimal,
        #[serde(with = "rust_decimal::serde::float")]
        rate: Decimal,
        /// Always `quantity * rate`; recomputed on every mutation.
        #[serde(with = "rust_decimal::serde::float")]
        amount: Decimal,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        customer_ref: Option<String>,
    },
}

impl LineItem {
    /// Create a category (account-based) line.
    pub fn category(
        account_ref: impl Into<String>,
        description: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self::Category {
            account_ref: account_ref.into(),
            description: description.into(),
            amount,
            customer_ref: None,
        }
    }

    /// Create an item (product-based) line. `amount` is derived, not passed.
    pub fn item(
        item_ref: impl Into<String>,
        description: impl Into<String>,
        quantity: Decimal,
        rate: Decimal,
    ) -> Self {
        Self::Item {
            item_ref: item_ref.into(),
            description: description.into(),
            quantity,
            rate,
            amount: quantity * rate,
            customer_ref: None,
        }
    }

    /// The line's contribution to the document total.
    ///
    /// Item lines recompute from quantity and rate rather than trusting the
    /// stored amount.
    pub fn amount(&self) -> Decimal {
        match self {
            Self::Category { amount, .. } => *amount,
            Self::Item { quantity, rate, .. } => *quantity * *rate,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Self::Category { description, .. } | Self::Item { description, .. } => description,
        }
    }

    pub fn customer_ref(&self) -> Option<&str> {
        match self {
            Self::Category { customer_ref, .. } | Self::Item { customer_ref, .. } => {
                customer_ref.as_deref()
            }
        }
    }

    /// Update the quantity of an item line, keeping `amount` in sync.
    /// No-op on category lines.
    pub fn set_quantity(&mut self, value: Decimal) {
        if let Self::Item { quantity, rate, amount, .. } = self {
            *quantity = value;
            *amount = *quantity * *rate;
        }
    }

    /// Update the rate of an item line, keeping `amount` in sync.
    /// No-op on category lines.
    pub fn set_rate(&mut self, value: Decimal) {
        if let Self::Item { quantity, rate, amount, .. } = self {
            *rate = value;
            *amount = *quantity * *rate;
        }
    }

    pub fn set_customer_ref(&mut self, value: Option<String>) {
        match self {
            Self::Category { customer_ref, .. } | Self::Item { customer_ref, .. } => {
                *customer_ref = value;
            }
        }
    }
}

// =============================================================================
// Document
// =============================================================================

/// A billing address on a document header.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub line1: String,
    #[serde(default)]
    pub line2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
    #[serde(rename = "type", default = "Address::default_kind")]
    pub kind: String,
}

impl Address {
    fn default_kind() -> String {
        "Billing".to_string()
    }

    /// A billing address with only the first line filled in.
    pub fn billing(line1: impl Into<String>) -> Self {
        Self {
            line1: line1.into(),
            kind: Self::default_kind(),
            ..Default::default()
        }
    }
}

/// An invoice or bill under edit.
///
/// Owned by one in-progress edit session; translated (never mutated) when
/// building an external payload. Nothing is persisted until the submission
/// call owned by the transport layer succeeds, so discarding the value is
/// cancellation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub kind: DocumentKind,
    pub platform: Platform,
    /// External id of the counterparty: customer for invoices, vendor for bills.
    pub counterparty_ref: String,
    pub counterparty_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counterparty_email: Option<String>,
    /// Document number (invoice number / bill number).
    #[serde(default)]
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default = "Document::default_status")]
    pub status: String,
    pub currency_code: String,
    pub date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_note: Option<String>,
    #[serde(default)]
    pub lines: Vec<LineItem>,
}

impl Document {
    fn default_status() -> String {
        "DRAFT".to_string()
    }

    /// Create an empty invoice for a customer.
    pub fn invoice(
        platform: Platform,
        customer_ref: impl Into<String>,
        customer_name: impl Into<String>,
        date: NaiveDate,
        due_date: NaiveDate,
    ) -> Self {
        Self::new(DocumentKind::Invoice, platform, customer_ref, customer_name, date, due_date)
    }

    /// Create an empty bill for a vendor.
    pub fn bill(
        platform: Platform,
        vendor_ref: impl Into<String>,
        vendor_name: impl Into<String>,
        date: NaiveDate,
        due_date: NaiveDate,
    ) -> Self {
        Self::new(DocumentKind::Bill, platform, vendor_ref, vendor_name, date, due_date)
    }

    fn new(
        kind: DocumentKind,
        platform: Platform,
        counterparty_ref: impl Into<String>,
        counterparty_name: impl Into<String>,
        date: NaiveDate,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            kind,
            platform,
            counterparty_ref: counterparty_ref.into(),
            counterparty_name: counterparty_name.into(),
            counterparty_email: None,
            number: String::new(),
            reference: None,
            status: Self::default_status(),
            currency_code: "USD".to_string(),
            date,
            due_date,
            addresses: Vec::new(),
            private_note: None,
            lines: Vec::new(),
        }
    }

    pub fn push_line(&mut self, line: LineItem) {
        self.lines.push(line);
    }

    /// Remove a line by position. Out-of-range indices are ignored.
    pub fn remove_line(&mut self, index: usize) {
        if index < self.lines.len() {
            self.lines.remove(index);
        }
    }
}

// =============================================================================
// Reference Tables
// =============================================================================

/// A ledger account, keyed by the platform's own id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub external_id: String,
    pub name: String,
    /// Platform classification, e.g. "Expense", "Accounts Payable".
    pub account_type: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// A product or service item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub external_id: String,
    /// Short code used by Xero line items; QuickBooks has no equivalent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub sales_unit_price: Decimal,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub external_id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line1: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub external_id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line1: Option<String>,
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Product Flags
// =============================================================================

/// Product type as exposed by the product form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ProductType {
    #[default]
    Service,
    Inventory,
}

/// Derived state of the sold / purchased / tracked-as-inventory toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFlags {
    pub sold: bool,
    pub purchased: bool,
    pub tracked_as_inventory: bool,
    /// Whether the operator may still toggle inventory tracking by hand.
    pub tracking_editable: bool,
}

/// Derive the interdependent product toggles from type and platform.
///
/// QuickBooks ties inventory tracking to the product type: `Inventory`
/// products are always tracked and the toggle is locked. Xero derives
/// tracking from the sold/purchased pair: once a product is both sold and
/// purchased it becomes tracked and the toggle locks.
pub fn derive_product_flags(
    product_type: ProductType,
    platform: Platform,
    sold: bool,
    purchased: bool,
) -> ProductFlags {
    match platform {
        Platform::QuickBooks => {
            let is_inventory = product_type == ProductType::Inventory;
            ProductFlags {
                sold,
                purchased,
                tracked_as_inventory: is_inventory,
                tracking_editable: !is_inventory,
            }
        }
        Platform::Xero => {
            let tracked = sold && purchased;
            ProductFlags {
                sold,
                purchased,
                tracked_as_inventory: tracked,
                tracking_editable: !tracked,
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
