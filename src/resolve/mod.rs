//! Reference resolution against externally supplied lookup tables.
//!
//! The service layer fetches accounts, products and customers and hands them
//! in as read-only snapshots; nothing here fetches or mutates. Resolution is
//! by the platform's own external id. The `apply_*` helpers implement the
//! entry-time editor rules: description defaulting, rate defaulting, and the
//! AP/AR restriction for bill lines.

use crate::error::{ResolveError, ResolveResult};
use crate::models::{Account, Customer, Document, DocumentKind, LineItem, Product};
use serde::{Deserialize, Serialize};

/// Account classifications that may not be booked against on a bill line.
const RESTRICTED_BILL_ACCOUNT_TYPES: [&str; 2] = ["Accounts Payable", "Accounts Receivable"];

/// Owned reference tables, as deserialized from a request body or refs file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceTables {
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub customers: Vec<Customer>,
}

impl ReferenceTables {
    pub fn as_set(&self) -> ReferenceSet<'_> {
        ReferenceSet::new(&self.accounts, &self.products, &self.customers)
    }
}

/// Borrowed view over the reference tables used during one resolution pass.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceSet<'a> {
    accounts: &'a [Account],
    products: &'a [Product],
    customers: &'a [Customer],
}

impl<'a> ReferenceSet<'a> {
    pub fn new(
        accounts: &'a [Account],
        products: &'a [Product],
        customers: &'a [Customer],
    ) -> Self {
        Self { accounts, products, customers }
    }

    pub fn resolve_account(&self, external_id: &str) -> Option<&'a Account> {
        self.accounts.iter().find(|a| a.external_id == external_id)
    }

    pub fn resolve_item(&self, external_id: &str) -> Option<&'a Product> {
        self.products.iter().find(|p| p.external_id == external_id)
    }

    pub fn resolve_customer(&self, external_id: &str) -> Option<&'a Customer> {
        self.customers.iter().find(|c| c.external_id == external_id)
    }
}

/// Reject accounts a bill line may not reference.
///
/// The rule applies only to bills; invoices never route through it.
pub fn check_bill_account(account: &Account) -> ResolveResult<()> {
    if RESTRICTED_BILL_ACCOUNT_TYPES.contains(&account.account_type.as_str()) {
        return Err(ResolveError::RestrictedAccount { name: account.name.clone() });
    }
    Ok(())
}

/// Assign an account to a category line, as the editor does when the operator
/// picks an account.
///
/// Enforces the AP/AR restriction for bills, then sets the account ref and
/// defaults an empty description to the account's display name. An explicit
/// description is never overwritten.
pub fn apply_account_to_line(
    line: &mut LineItem,
    kind: DocumentKind,
    refs: &ReferenceSet,
    external_id: &str,
) -> ResolveResult<()> {
    let account = refs
        .resolve_account(external_id)
        .ok_or_else(|| ResolveError::UnknownAccount(external_id.to_string()))?;

    if kind == DocumentKind::Bill {
        check_bill_account(account)?;
    }

    if let LineItem::Category { account_ref, description, .. } = line {
        *account_ref = account.external_id.clone();
        if description.trim().is_empty() {
            *description = account.name.clone();
        }
    }

    Ok(())
}

/// Assign a product to an item line, as the editor does when the operator
/// picks a product.
///
/// Sets the item ref, defaults an empty description to the product's
/// description (falling back to its name), defaults the rate to the product's
/// sales unit price, and recomputes the line amount.
pub fn apply_product_to_line(
    line: &mut LineItem,
    refs: &ReferenceSet,
    external_id: &str,
) -> ResolveResult<()> {
    let product = refs
        .resolve_item(external_id)
        .ok_or_else(|| ResolveError::UnknownProduct(external_id.to_string()))?;

    if let LineItem::Item { item_ref, description, .. } = line {
        *item_ref = product.external_id.clone();
        if description.trim().is_empty() {
            *description = if product.description.is_empty() {
                product.name.clone()
            } else {
                product.description.clone()
            };
        }
    }
    line.set_rate(product.sales_unit_price);

    Ok(())
}

/// Convenience for the editor: apply an account pick to a line of `doc`.
pub fn pick_account(
    doc: &mut Document,
    line_index: usize,
    refs: &ReferenceSet,
    external_id: &str,
) -> ResolveResult<()> {
    let kind = doc.kind;
    if let Some(line) = doc.lines.get_mut(line_index) {
        apply_account_to_line(line, kind, refs, external_id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn account(id: &str, name: &str, account_type: &str) -> Account {
        Account {
            external_id: id.to_string(),
            name: name.to_string(),
            account_type: account_type.to_string(),
            active: true,
        }
    }

    fn product(id: &str, name: &str, price: &str) -> Product {
        Product {
            external_id: id.to_string(),
            code: Some(format!("SKU-{id}")),
            name: name.to_string(),
            description: String::new(),
            sales_unit_price: price.parse().unwrap(),
            active: true,
        }
    }

    #[test]
    fn test_resolution_by_external_id() {
        let accounts = vec![account("33", "Office Supplies", "Expense")];
        let products = vec![product("7", "Widget", "2.5")];
        let customers = vec![Customer {
            external_id: "C1".to_string(),
            display_name: "Acme".to_string(),
            email: None,
            address_line1: None,
        }];
        let refs = ReferenceSet::new(&accounts, &products, &customers);

        assert_eq!(refs.resolve_account("33").unwrap().name, "Office Supplies");
        assert_eq!(refs.resolve_item("7").unwrap().name, "Widget");
        assert_eq!(refs.resolve_customer("C1").unwrap().display_name, "Acme");
        assert!(refs.resolve_account("99").is_none());
    }

    #[test]
    fn test_ap_ar_accounts_rejected_on_bills_only() {
        let ap = account("40", "Accounts Payable (A/P)", "Accounts Payable");
        let err = check_bill_account(&ap).unwrap_err();
        assert_eq!(
            err,
            ResolveError::RestrictedAccount { name: "Accounts Payable (A/P)".to_string() }
        );

        // on an invoice the same account passes through apply_account_to_line
        let accounts = vec![ap];
        let refs = ReferenceSet::new(&accounts, &[], &[]);
        let mut line = LineItem::category("", "", d("10"));
        apply_account_to_line(&mut line, DocumentKind::Invoice, &refs, "40").unwrap();

        let mut line = LineItem::category("", "", d("10"));
        assert!(apply_account_to_line(&mut line, DocumentKind::Bill, &refs, "40").is_err());
    }

    #[test]
    fn test_account_pick_defaults_empty_description() {
        let accounts = vec![account("33", "Office Supplies", "Expense")];
        let refs = ReferenceSet::new(&accounts, &[], &[]);

        let mut line = LineItem::category("", "", d("10"));
        apply_account_to_line(&mut line, DocumentKind::Bill, &refs, "33").unwrap();
        assert_eq!(line.description(), "Office Supplies");

        // explicit description is never overwritten
        let mut line = LineItem::category("", "ink cartridges", d("10"));
        apply_account_to_line(&mut line, DocumentKind::Bill, &refs, "33").unwrap();
        assert_eq!(line.description(), "ink cartridges");
    }

    #[test]
    fn test_product_pick_defaults_rate_and_recomputes_amount() {
        let products = vec![product("7", "Widget", "2.5")];
        let refs = ReferenceSet::new(&[], &products, &[]);

        let mut line = LineItem::item("", "", d("3"), Decimal::ZERO);
        apply_product_to_line(&mut line, &refs, "7").unwrap();

        assert_eq!(line.description(), "Widget");
        assert_eq!(line.amount(), d("7.5"));
    }

    #[test]
    fn test_unknown_references() {
        let refs = ReferenceSet::new(&[], &[], &[]);
        let mut line = LineItem::item("", "", d("1"), d("1"));
        assert_eq!(
            apply_product_to_line(&mut line, &refs, "7").unwrap_err(),
            ResolveError::UnknownProduct("7".to_string())
        );
    }
}
