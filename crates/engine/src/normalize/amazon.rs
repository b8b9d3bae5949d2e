//! Amazon order conversion.
//!
//! The order-level money figures are sums over each line item's
//! individually-reported contributions, accumulated with exact decimals so
//! multi-item orders never pick up cumulative rounding error.

use orderdeck_core::{
    CUSTOMER_NAME_MAX, ITEM_TITLE_MAX, LineItem, Order, Platform, round_money, truncate_chars,
};
use rust_decimal::Decimal;

use crate::error::SyncError;
use crate::platforms::amazon::{AmazonMoney, AmazonOrder};

use super::{parse_amount, strip_zone};

pub(super) fn normalize(order: &AmazonOrder) -> Result<(Order, Vec<LineItem>), SyncError> {
    let mut subtotal = Decimal::ZERO;
    let mut tax = Decimal::ZERO;
    let mut delivery = Decimal::ZERO;
    let mut discount = Decimal::ZERO;
    for item in &order.items {
        subtotal += money(item.item_price.as_ref(), "ItemPrice")?;
        tax += money(item.item_tax.as_ref(), "ItemTax")?;
        delivery += money(item.shipping_price.as_ref(), "ShippingPrice")?;
        discount += money(item.promotion_discount.as_ref(), "PromotionDiscount")?
            + money(item.shipping_discount.as_ref(), "ShippingDiscount")?;
    }

    // Pending orders carry no OrderTotal yet; reconstruct it from the items.
    let total = match order.header.order_total.as_ref() {
        Some(reported) => parse_amount(&reported.amount, "OrderTotal")?,
        None => subtotal + tax + delivery - discount,
    };

    let buyer_name = order
        .header
        .buyer_info
        .as_ref()
        .and_then(|buyer| buyer.buyer_name.as_deref())
        .unwrap_or_default();

    let canonical = Order {
        order_id: order.header.amazon_order_id.clone(),
        platform: Platform::Amazon,
        creation_date: strip_zone(&order.header.purchase_date),
        customer_name: truncate_chars(buyer_name, CUSTOMER_NAME_MAX),
        subtotal_amount: round_money(subtotal),
        discount_amount: round_money(discount),
        delivery_amount: round_money(delivery),
        tax_amount: round_money(tax),
        total_amount: round_money(total),
    };

    let line_items = order
        .items
        .iter()
        .map(|item| {
            Ok(LineItem {
                line_id: item.order_item_id.clone(),
                order_id: order.header.amazon_order_id.clone(),
                sku: item.seller_sku.clone().unwrap_or_default(),
                title: truncate_chars(&item.title, ITEM_TITLE_MAX),
                quantity: item.quantity_ordered,
                total_amount: round_money(money(item.item_price.as_ref(), "ItemPrice")?),
            })
        })
        .collect::<Result<Vec<_>, SyncError>>()?;

    Ok((canonical, line_items))
}

/// A per-item money component; absent means zero.
fn money(amount: Option<&AmazonMoney>, field: &'static str) -> Result<Decimal, SyncError> {
    amount.map_or(Ok(Decimal::ZERO), |m| parse_amount(&m.amount, field))
}

#[cfg(test)]
mod tests {
    use crate::platforms::amazon::{AmazonOrderHeader, AmazonOrderItem};

    use super::*;

    fn item(id: &str, price: &str, tax: &str, shipping: &str, discount: &str) -> AmazonOrderItem {
        serde_json::from_value(serde_json::json!({
            "OrderItemId": id,
            "SellerSKU": "SKU-1",
            "Title": "Example item",
            "QuantityOrdered": 1,
            "ItemPrice": {"CurrencyCode": "USD", "Amount": price},
            "ItemTax": {"CurrencyCode": "USD", "Amount": tax},
            "ShippingPrice": {"CurrencyCode": "USD", "Amount": shipping},
            "PromotionDiscount": {"CurrencyCode": "USD", "Amount": discount}
        }))
        .expect("item fixture parses")
    }

    fn header(total: Option<&str>) -> AmazonOrderHeader {
        let mut value = serde_json::json!({
            "AmazonOrderId": "902-3159896-1390916",
            "PurchaseDate": "2017-01-20T19:49:35Z",
            "BuyerInfo": {"BuyerName": "Ana Carolina"}
        });
        if let (Some(total), Some(map)) = (total, value.as_object_mut()) {
            map.insert(
                "OrderTotal".to_string(),
                serde_json::json!({"CurrencyCode": "USD", "Amount": total}),
            );
        }
        serde_json::from_value(value).expect("header fixture parses")
    }

    #[test]
    fn test_sums_item_contributions_exactly() {
        // Three items whose tax components are classic float troublemakers:
        // 0.10 + 0.20 + 0.30 must come out exactly 0.60.
        let order = AmazonOrder {
            header: header(Some("34.05")),
            items: vec![
                item("1", "10.00", "0.10", "1.00", "0.50"),
                item("2", "10.00", "0.20", "1.00", "0.50"),
                item("3", "10.00", "0.30", "1.00", "0.25"),
            ],
        };
        let (canonical, items) = normalize(&order).expect("normalizes");

        assert_eq!(canonical.subtotal_amount, Decimal::new(3000, 2));
        assert_eq!(canonical.tax_amount, Decimal::new(60, 2));
        assert_eq!(canonical.delivery_amount, Decimal::new(300, 2));
        assert_eq!(canonical.discount_amount, Decimal::new(125, 2));
        assert_eq!(canonical.total_amount, Decimal::new(3405, 2));
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn test_missing_order_total_is_reconstructed() {
        let order = AmazonOrder {
            header: header(None),
            items: vec![item("1", "25.99", "1.26", "0.00", "0.00")],
        };
        let (canonical, _) = normalize(&order).expect("normalizes");
        assert_eq!(canonical.total_amount, Decimal::new(2725, 2));
    }

    #[test]
    fn test_buyer_name_defaults_to_empty() {
        let mut raw_header = header(Some("10.00"));
        raw_header.buyer_info = None;
        let order = AmazonOrder {
            header: raw_header,
            items: Vec::new(),
        };
        let (canonical, _) = normalize(&order).expect("normalizes");
        assert_eq!(canonical.customer_name, "");
        assert_eq!(canonical.creation_date, "2017-01-20T19:49:35");
    }
}
