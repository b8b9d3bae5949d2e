//! Raw platform shapes mapped into the canonical schema.
//!
//! One conversion module per platform, dispatched over [`RawOrder`]. All
//! monetary outputs are rounded to exactly two fractional digits here, at
//! the point of storage, and oversized free text is truncated to its
//! column limit rather than rejected.

mod amazon;
mod ebay;
mod woocommerce;

use orderdeck_core::{LineItem, Order};
use rust_decimal::Decimal;

use crate::error::SyncError;
use crate::platforms::RawOrder;

/// Map a raw platform record into a canonical order and its line items.
///
/// # Errors
///
/// Returns `SyncError::Decode` when a monetary field does not parse; the
/// orchestrator fails that platform's run.
pub fn normalize(raw: &RawOrder) -> Result<(Order, Vec<LineItem>), SyncError> {
    match raw {
        RawOrder::Ebay(order) => ebay::normalize(order),
        RawOrder::Amazon(order) => amazon::normalize(order),
        RawOrder::WooCommerce(order) => woocommerce::normalize(order),
    }
}

/// Parse a platform decimal string.
fn parse_amount(value: &str, field: &'static str) -> Result<Decimal, SyncError> {
    value
        .trim()
        .parse::<Decimal>()
        .map_err(|err| SyncError::Decode(format!("invalid amount in {field}: {err}")))
}

/// ISO timestamp with the trailing zone marker stripped, the canonical
/// `creation_date` form.
fn strip_zone(timestamp: &str) -> String {
    timestamp.trim_end_matches('Z').to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_accepts_platform_strings() {
        assert_eq!(parse_amount("29.35", "total").expect("parses"), Decimal::new(2935, 2));
        assert_eq!(parse_amount(" 0.00 ", "total").expect("parses"), Decimal::ZERO);
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        let err = parse_amount("", "total").unwrap_err();
        assert!(matches!(err, SyncError::Decode(_)));
        assert!(err.to_string().contains("total"));
    }

    #[test]
    fn test_strip_zone() {
        assert_eq!(strip_zone("2015-08-04T19:09:02.768Z"), "2015-08-04T19:09:02.768");
        // Already-naive timestamps pass through unchanged.
        assert_eq!(strip_zone("2017-03-22T16:28:02"), "2017-03-22T16:28:02");
    }
}
