//! Cart pricing rules using decimal arithmetic.
//!
//! Tax rate, shipping surcharge, and the free-shipping threshold are
//! configuration values, not hard-coded in the totals math. All money math
//! uses `rust_decimal` to avoid binary floating point drift.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Pricing rules applied when deriving a cart snapshot's totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingRules {
    /// Sales tax rate applied to the subtotal (e.g., 0.08 for 8%).
    pub tax_rate: Decimal,
    /// Flat shipping surcharge for orders at or below the threshold.
    pub shipping_surcharge: Decimal,
    /// Subtotals strictly above this threshold ship free.
    pub free_shipping_threshold: Decimal,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            // 0.08
            tax_rate: Decimal::new(8, 2),
            // 5.99
            shipping_surcharge: Decimal::new(599, 2),
            // 50
            free_shipping_threshold: Decimal::new(50, 0),
        }
    }
}

impl PricingRules {
    /// Shipping cost for a given subtotal.
    ///
    /// Free strictly above the threshold; the surcharge applies at or below
    /// it (a 50.00 subtotal still pays the surcharge).
    #[must_use]
    pub fn shipping(&self, subtotal: Decimal) -> Decimal {
        if subtotal > self.free_shipping_threshold {
            Decimal::ZERO
        } else {
            self.shipping_surcharge
        }
    }

    /// Grand total for a given subtotal: `subtotal * (1 + tax) + shipping`,
    /// rounded to two decimal places.
    #[must_use]
    pub fn total(&self, subtotal: Decimal) -> Decimal {
        let taxed = subtotal * (Decimal::ONE + self.tax_rate);
        (taxed + self.shipping(subtotal)).round_dp(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().expect("valid decimal literal")
    }

    #[test]
    fn test_total_below_threshold_includes_surcharge() {
        let rules = PricingRules::default();
        // 40 * 1.08 + 5.99 = 49.19
        assert_eq!(rules.total(dec("40.00")), dec("49.19"));
    }

    #[test]
    fn test_total_above_threshold_ships_free() {
        let rules = PricingRules::default();
        // 60 * 1.08 = 64.80
        assert_eq!(rules.total(dec("60.00")), dec("64.80"));
    }

    #[test]
    fn test_threshold_is_strict() {
        let rules = PricingRules::default();
        // Exactly 50 is not "over 50": surcharge still applies.
        assert_eq!(rules.shipping(dec("50.00")), dec("5.99"));
        assert_eq!(rules.shipping(dec("50.01")), Decimal::ZERO);
    }

    #[test]
    fn test_empty_cart_total() {
        let rules = PricingRules::default();
        // A zero subtotal is at the threshold, so the surcharge applies.
        assert_eq!(rules.total(Decimal::ZERO), dec("5.99"));
    }

    #[test]
    fn test_total_rounds_to_cents() {
        let rules = PricingRules::default();
        // 10.55 * 1.08 = 11.394 -> 11.39 + 5.99 = 17.38
        assert_eq!(rules.total(dec("10.55")), dec("17.38"));
    }
}
