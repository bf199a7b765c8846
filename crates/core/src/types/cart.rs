//! Cart lines and the materialized cart snapshot.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::id::ProductId;
use crate::types::pricing::PricingRules;

/// One product's presence in a cart.
///
/// At most one line exists per product; adding the same product again
/// increments the quantity of the existing line. A quantity of zero is
/// modeled as absence of the line, never as a stored zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Stable external product identifier, unique within a cart.
    pub product_id: ProductId,
    /// Units of the product in the cart (always >= 1).
    pub quantity: u32,
    /// Unit price snapshotted at add time; never re-fetched on reload.
    pub unit_price: Decimal,
}

impl CartLine {
    /// Extended price for this line (`unit_price * quantity`).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Input for adding a product to the cart.
///
/// Carries the display name so the caller can be told what was added; the
/// name is not part of the persisted line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCartItem {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Decimal,
}

/// The materialized cart view handed to consumers.
///
/// A snapshot is replaced wholesale after every successful mutation and on
/// manual refresh; it is never patched in place. `item_count`, `subtotal`,
/// and `total` are derived from the line list on every republish and are
/// never persisted independently of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Lines in first-add insertion order. Ordering is not guaranteed to be
    /// stable across reloads from a remote store.
    pub lines: Vec<CartLine>,
    /// Sum of all line quantities.
    pub item_count: u32,
    /// Sum of `unit_price * quantity` over all lines.
    pub subtotal: Decimal,
    /// `subtotal * (1 + tax) + shipping`, per the pricing rules.
    pub total: Decimal,
}

impl CartSnapshot {
    /// The all-zero placeholder published before the first load completes.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Derive a snapshot from a line list under the given pricing rules.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>, rules: &PricingRules) -> Self {
        let item_count = lines.iter().map(|line| line.quantity).sum();
        let subtotal: Decimal = lines.iter().map(CartLine::line_total).sum();
        let total = rules.total(subtotal);

        Self {
            lines,
            item_count,
            subtotal,
            total,
        }
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().expect("valid decimal literal")
    }

    fn line(id: &str, quantity: u32, unit_price: &str) -> CartLine {
        CartLine {
            product_id: ProductId::new(id),
            quantity,
            unit_price: dec(unit_price),
        }
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line("a", 3, "9.99").line_total(), dec("29.97"));
    }

    #[test]
    fn test_snapshot_derives_count_and_subtotal() {
        let rules = PricingRules::default();
        let snapshot = CartSnapshot::from_lines(
            vec![line("a", 2, "10.00"), line("b", 1, "20.00")],
            &rules,
        );

        assert_eq!(snapshot.item_count, 3);
        assert_eq!(snapshot.subtotal, dec("40.00"));
        // 40 * 1.08 + 5.99
        assert_eq!(snapshot.total, dec("49.19"));
    }

    #[test]
    fn test_snapshot_free_shipping_over_threshold() {
        let rules = PricingRules::default();
        let snapshot = CartSnapshot::from_lines(vec![line("a", 3, "20.00")], &rules);

        assert_eq!(snapshot.subtotal, dec("60.00"));
        assert_eq!(snapshot.total, dec("64.80"));
    }

    #[test]
    fn test_item_count_is_sum_of_quantities() {
        let rules = PricingRules::default();
        let snapshot = CartSnapshot::from_lines(
            vec![line("a", 5, "1.00"), line("b", 7, "1.00"), line("c", 1, "1.00")],
            &rules,
        );
        let expected: u32 = snapshot.lines.iter().map(|l| l.quantity).sum();
        assert_eq!(snapshot.item_count, expected);
    }

    #[test]
    fn test_empty_placeholder_is_all_zero() {
        let snapshot = CartSnapshot::empty();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot.item_count, 0);
        assert_eq!(snapshot.subtotal, Decimal::ZERO);
        assert_eq!(snapshot.total, Decimal::ZERO);
    }
}
