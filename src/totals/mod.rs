//! Line-item aggregation shared by invoices and bills.
//!
//! Category lines contribute their amount, item lines contribute
//! `quantity * rate` recomputed at aggregation time. Totals are always
//! computable, including on a half-filled form, so live display never faults.

use crate::models::LineItem;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Subtotal and total of a document.
///
/// Tax is fixed at zero in this version, so `total == subtotal` always.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTotals {
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

/// Compute totals over a set of lines.
///
/// Pure and idempotent; intermediate sums are exact decimals, rounding
/// happens only at display via [`format_currency`].
pub fn aggregate(lines: &[LineItem]) -> DocumentTotals {
    let subtotal: Decimal = lines.iter().map(LineItem::amount).sum();
    DocumentTotals { subtotal, total: subtotal }
}

/// Format a monetary value for display, rounded to two decimal places.
pub fn format_currency(amount: Decimal) -> String {
    format!("${}", amount.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_mixed_line_kinds() {
        let lines = vec![
            LineItem::category("33", "supplies", d("100")),
            LineItem::item("7", "widgets", d("3"), d("2.5")),
        ];
        let totals = aggregate(&lines);
        assert_eq!(totals.subtotal, d("107.5"));
        assert_eq!(totals.total, totals.subtotal);
    }

    #[test]
    fn test_single_item_line() {
        let lines = vec![LineItem::item("7", "widgets", d("3"), d("2.5"))];
        assert_eq!(aggregate(&lines).subtotal, d("7.5"));
    }

    #[test]
    fn test_item_amount_recomputed_not_trusted() {
        // a stale stored amount must not leak into totals
        let mut line = LineItem::item("7", "widgets", d("3"), d("2.5"));
        if let LineItem::Item { amount, .. } = &mut line {
            *amount = d("999");
        }
        assert_eq!(aggregate(&[line]).total, d("7.5"));
    }

    #[test]
    fn test_empty_and_zero_lines() {
        assert_eq!(aggregate(&[]).total, Decimal::ZERO);

        let lines = vec![LineItem::item("7", "", Decimal::ZERO, Decimal::ZERO)];
        assert_eq!(aggregate(&lines).total, Decimal::ZERO);
    }

    #[test]
    fn test_aggregation_idempotent() {
        let lines = vec![
            LineItem::category("33", "a", d("0.1")),
            LineItem::category("34", "b", d("0.2")),
        ];
        let first = aggregate(&lines);
        let second = aggregate(&lines);
        assert_eq!(first, second);
        // exact decimal arithmetic, no float drift
        assert_eq!(first.total, d("0.3"));
    }

    #[test]
    fn test_format_currency_rounds_at_display_only() {
        let lines = vec![
            LineItem::item("1", "", d("3"), d("0.333")),
            LineItem::item("2", "", d("3"), d("0.333")),
        ];
        let totals = aggregate(&lines);
        assert_eq!(totals.total, d("1.998"));
        assert_eq!(format_currency(totals.total), "$2.00");
    }
}
