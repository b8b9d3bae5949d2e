//! WooCommerce REST API fetcher.
//!
//! Offset pagination: request fixed-size pages from page 1, stopping at the
//! first already-imported order number or at a short page (the server's
//! signal for the last one). Authentication is the store's consumer key
//! pair in the query string; there is no token lifecycle.

use std::collections::HashSet;

use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::instrument;

use crate::credentials::CredentialStore;
use crate::error::SyncError;
use crate::throttle::send_with_backoff;

/// Orders per page; a shorter page means the last one.
pub(crate) const PAGE_SIZE: usize = 100;

/// Orders resource path under the store base URL.
const ORDERS_PATH: &str = "/wp-json/wc/v3/orders";

/// WooCommerce REST API fetcher.
#[derive(Debug, Clone)]
pub struct WooConnector {
    http: reqwest::Client,
}

/// A raw WooCommerce order.
#[derive(Debug, Clone, Deserialize)]
pub struct WooOrder {
    /// Customer-facing order number, the platform identity.
    pub number: String,
    /// Creation timestamp in GMT, ISO-8601 without zone suffix.
    pub date_created_gmt: String,
    /// Numeric customer id; 0 for guest checkout.
    pub customer_id: i64,
    /// Total discount, decimal string.
    pub discount_total: String,
    /// Shipping charge, decimal string.
    pub shipping_total: String,
    /// Tax total, decimal string.
    pub total_tax: String,
    /// Grand total, decimal string.
    pub total: String,
    /// Embedded line items.
    #[serde(default)]
    pub line_items: Vec<WooLineItem>,
}

/// A raw WooCommerce line item.
#[derive(Debug, Clone, Deserialize)]
pub struct WooLineItem {
    /// Numeric line id.
    pub id: i64,
    /// SKU, empty or absent for unlisted products.
    #[serde(default)]
    pub sku: Option<String>,
    /// Product name.
    pub name: String,
    /// Units ordered.
    pub quantity: i32,
    /// Line total, decimal string.
    pub total: String,
}

impl WooConnector {
    /// Build a fetcher over a shared HTTP client.
    #[must_use]
    pub const fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Fetch orders page by page until a known order number or a short page.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` on transport or non-throttle HTTP failure.
    #[instrument(skip(self, creds, known_ids))]
    pub async fn fetch_new_orders(
        &self,
        creds: &CredentialStore,
        known_ids: &HashSet<String>,
    ) -> Result<Vec<WooOrder>, SyncError> {
        let wc = creds.woocommerce();
        let url = format!("{}{}", wc.api_base, ORDERS_PATH);
        let per_page = PAGE_SIZE.to_string();

        let mut orders = Vec::new();
        let mut page_number = 1_usize;
        loop {
            let page_param = page_number.to_string();
            let response = send_with_backoff(|| {
                self.http.get(&url).query(&[
                    ("consumer_key", wc.consumer_key.as_str()),
                    ("consumer_secret", wc.consumer_secret.expose_secret()),
                    ("per_page", per_page.as_str()),
                    ("page", page_param.as_str()),
                ])
            })
            .await?;
            let page: Vec<WooOrder> = response.json().await?;

            let full_page = page.len() >= PAGE_SIZE;
            let keep_going = absorb_page(&mut orders, page, known_ids);
            if !keep_going || !full_page {
                break;
            }
            page_number += 1;
        }

        tracing::debug!(count = orders.len(), "woocommerce fetch complete");
        Ok(orders)
    }
}

/// Append unseen records in page order; returns whether pagination should
/// continue (false once a known order number is hit).
fn absorb_page(
    collected: &mut Vec<WooOrder>,
    page: Vec<WooOrder>,
    known_ids: &HashSet<String>,
) -> bool {
    for order in page {
        if known_ids.contains(&order.number) {
            return false;
        }
        collected.push(order);
    }
    true
}
