//! WooCommerce order conversion.
//!
//! The platform reports discount, tax, shipping, and total individually but
//! no subtotal; it is reconstructed as `total - tax - delivery + discount`
//! in integer cents so binary floating point never drifts the figures.

use orderdeck_core::{
    CUSTOMER_NAME_MAX, ITEM_TITLE_MAX, LineItem, Order, Platform, from_cents, round_money,
    to_cents, truncate_chars,
};

use crate::error::SyncError;
use crate::platforms::woocommerce::WooOrder;

use super::{parse_amount, strip_zone};

pub(super) fn normalize(order: &WooOrder) -> Result<(Order, Vec<LineItem>), SyncError> {
    let discount = round_money(parse_amount(&order.discount_total, "discount_total")?);
    let delivery = round_money(parse_amount(&order.shipping_total, "shipping_total")?);
    let tax = round_money(parse_amount(&order.total_tax, "total_tax")?);
    let total = round_money(parse_amount(&order.total, "total")?);
    let subtotal =
        from_cents(to_cents(total) - to_cents(tax) - to_cents(delivery) + to_cents(discount));

    let canonical = Order {
        order_id: order.number.clone(),
        platform: Platform::WooCommerce,
        creation_date: strip_zone(&order.date_created_gmt),
        customer_name: truncate_chars(&order.customer_id.to_string(), CUSTOMER_NAME_MAX),
        subtotal_amount: subtotal,
        discount_amount: discount,
        delivery_amount: delivery,
        tax_amount: tax,
        total_amount: total,
    };

    let line_items = order
        .line_items
        .iter()
        .map(|item| {
            Ok(LineItem {
                line_id: item.id.to_string(),
                order_id: order.number.clone(),
                sku: item.sku.clone().unwrap_or_default(),
                title: truncate_chars(&item.name, ITEM_TITLE_MAX),
                quantity: item.quantity,
                total_amount: round_money(parse_amount(&item.total, "line_items.total")?),
            })
        })
        .collect::<Result<Vec<_>, SyncError>>()?;

    Ok((canonical, line_items))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn fixture(discount: &str, shipping: &str, tax: &str, total: &str) -> WooOrder {
        serde_json::from_value(serde_json::json!({
            "number": "727",
            "date_created_gmt": "2017-03-22T16:28:02",
            "customer_id": 26,
            "discount_total": discount,
            "shipping_total": shipping,
            "total_tax": tax,
            "total": total,
            "line_items": [
                {"id": 315, "name": "Woo Single #1", "quantity": 2,
                 "sku": "woo-single-1", "total": "6.00"}
            ]
        }))
        .expect("fixture parses")
    }

    #[test]
    fn test_subtotal_is_derived_from_components() {
        let (order, _) = normalize(&fixture("10.00", "10.00", "1.35", "29.35")).expect("normalizes");
        // 29.35 - 1.35 - 10.00 + 10.00 = 28.00
        assert_eq!(order.subtotal_amount, Decimal::new(2800, 2));
        assert_eq!(order.customer_name, "26");
        assert_eq!(order.creation_date, "2017-03-22T16:28:02");
    }

    #[test]
    fn test_component_identity_holds_to_the_cent() {
        // Values chosen to be lossy in binary floating point.
        let cases = [
            ("0.00", "0.00", "0.00", "0.00"),
            ("1.50", "4.99", "0.83", "10.10"),
            ("0.10", "0.20", "0.30", "0.70"),
            ("33.33", "7.77", "2.22", "111.11"),
        ];
        for (discount, shipping, tax, total) in cases {
            let (order, _) =
                normalize(&fixture(discount, shipping, tax, total)).expect("normalizes");
            assert_eq!(
                order.subtotal_amount + order.tax_amount + order.delivery_amount
                    - order.discount_amount,
                order.total_amount,
                "identity failed for total {total}"
            );
        }
    }

    #[test]
    fn test_line_items_map_numeric_ids_to_strings() {
        let (_, items) = normalize(&fixture("0.00", "0.00", "0.00", "6.00")).expect("normalizes");
        let line = items.first().expect("one line");
        assert_eq!(line.line_id, "315");
        assert_eq!(line.order_id, "727");
        assert_eq!(line.total_amount, Decimal::new(600, 2));
    }
}
