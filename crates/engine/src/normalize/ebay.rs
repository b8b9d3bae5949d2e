//! eBay order conversion.

use orderdeck_core::{
    CUSTOMER_NAME_MAX, ITEM_TITLE_MAX, LineItem, Order, Platform, round_money, truncate_chars,
};
use rust_decimal::Decimal;

use crate::error::SyncError;
use crate::platforms::ebay::{EbayAmount, EbayOrder};

use super::{parse_amount, strip_zone};

pub(super) fn normalize(order: &EbayOrder) -> Result<(Order, Vec<LineItem>), SyncError> {
    let pricing = &order.pricing_summary;
    let canonical = Order {
        order_id: order.order_id.clone(),
        platform: Platform::Ebay,
        creation_date: strip_zone(&order.creation_date),
        customer_name: truncate_chars(&order.buyer.username, CUSTOMER_NAME_MAX),
        subtotal_amount: component(pricing.price_subtotal.as_ref(), "priceSubtotal")?,
        discount_amount: component(
            pricing.price_discount_subtotal.as_ref(),
            "priceDiscountSubtotal",
        )?,
        delivery_amount: component(pricing.delivery_cost.as_ref(), "deliveryCost")?,
        tax_amount: component(pricing.tax.as_ref(), "tax")?,
        total_amount: component(pricing.total.as_ref(), "total")?,
    };

    let line_items = order
        .line_items
        .iter()
        .map(|item| {
            Ok(LineItem {
                line_id: item.line_item_id.clone(),
                order_id: order.order_id.clone(),
                sku: item.sku.clone().unwrap_or_default(),
                title: truncate_chars(&item.title, ITEM_TITLE_MAX),
                quantity: item.quantity,
                total_amount: component(item.total.as_ref(), "lineItems.total")?,
            })
        })
        .collect::<Result<Vec<_>, SyncError>>()?;

    Ok((canonical, line_items))
}

/// A pricing component; absent means zero on zero-value orders.
fn component(amount: Option<&EbayAmount>, field: &'static str) -> Result<Decimal, SyncError> {
    amount
        .map_or(Ok(Decimal::ZERO), |a| parse_amount(&a.value, field))
        .map(round_money)
}
