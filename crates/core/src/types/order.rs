//! The canonical order schema.
//!
//! Every platform-specific raw shape is normalized into these two types
//! before insertion. Rows are insert-only: an order is created once from a
//! raw platform record and never updated afterwards.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::platform::Platform;

/// Storage limit for [`Order::customer_name`], in characters.
pub const CUSTOMER_NAME_MAX: usize = 128;

/// Storage limit for [`LineItem::title`], in characters.
pub const ITEM_TITLE_MAX: usize = 256;

/// A normalized order.
///
/// `(order_id, platform)` uniquely identifies a row; `order_id` formatting
/// is platform-specific but always carried as a string. `creation_date` is
/// an ISO-8601 UTC timestamp with the trailing zone marker stripped,
/// e.g. `2015-08-04T19:09:02.768`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Platform-issued order identifier.
    pub order_id: String,
    /// Platform the order was imported from.
    pub platform: Platform,
    /// UTC creation timestamp, ISO-8601 without zone suffix.
    pub creation_date: String,
    /// Buyer identity as the platform reports it (username or numeric id).
    pub customer_name: String,
    /// Merchandise subtotal before discount, delivery, and tax.
    pub subtotal_amount: Decimal,
    /// Total discount applied.
    pub discount_amount: Decimal,
    /// Delivery/shipping charge.
    pub delivery_amount: Decimal,
    /// Total tax.
    pub tax_amount: Decimal,
    /// Grand total charged.
    pub total_amount: Decimal,
}

/// A normalized order line.
///
/// Logically a child of [`Order`] via `order_id`; created alongside its
/// parent, same insert-only lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Platform-issued line identifier.
    pub line_id: String,
    /// Parent order identifier.
    pub order_id: String,
    /// Stock keeping unit; empty when the platform omits it.
    pub sku: String,
    /// Item title.
    pub title: String,
    /// Units ordered.
    pub quantity: i32,
    /// Line total.
    pub total_amount: Decimal,
}
