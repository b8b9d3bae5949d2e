//! Monetary helpers over exact decimal arithmetic.
//!
//! All canonical amounts are `DECIMAL(9,2)` in storage. Derived amounts
//! (e.g. a subtotal reconstructed from component totals) are computed in
//! integer cents so no binary floating point ever touches money.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Convert an amount to integer cents, rounding half away from zero.
#[must_use]
pub fn to_cents(amount: Decimal) -> i64 {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .unwrap_or(0)
}

/// Convert integer cents back to a two-decimal amount.
#[must_use]
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Round an amount to exactly two fractional digits for storage.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cents_round_trip() {
        let amount = Decimal::new(1999, 2); // 19.99
        assert_eq!(to_cents(amount), 1999);
        assert_eq!(from_cents(1999), amount);
    }

    #[test]
    fn test_to_cents_rounds_half_away_from_zero() {
        // 0.005 -> 1 cent, not banker's 0
        assert_eq!(to_cents(Decimal::new(5, 3)), 1);
        assert_eq!(to_cents(Decimal::new(-5, 3)), -1);
    }

    #[test]
    fn test_round_money_two_places() {
        assert_eq!(round_money(Decimal::new(12345, 3)), Decimal::new(1235, 2)); // 12.345 -> 12.35
        assert_eq!(round_money(Decimal::new(10, 1)), Decimal::new(100, 2)); // 1.0 -> 1.00
    }

    #[test]
    fn test_component_identity_in_cents() {
        // total - tax - delivery + discount must reconstruct the subtotal
        // exactly, for values that are lossy in binary floating point.
        let total = Decimal::new(1010, 2); // 10.10
        let tax = Decimal::new(83, 2); // 0.83
        let delivery = Decimal::new(499, 2); // 4.99
        let discount = Decimal::new(150, 2); // 1.50

        let subtotal =
            from_cents(to_cents(total) - to_cents(tax) - to_cents(delivery) + to_cents(discount));
        assert_eq!(subtotal, Decimal::new(578, 2)); // 5.78
        assert_eq!(subtotal + tax + delivery - discount, total);
    }
}
