//! Amazon Selling Partner API fetcher.
//!
//! Orders are filtered server-side with `CreatedAfter` set to the stored
//! watermark and paginated by `NextToken` until absent. Line items live on
//! a separate resource: each order triggers a sub-fetch with its own
//! `NextToken` pagination and the same throttle wrapper - a nested instance
//! of the fetch contract, not a special case. Every call is SigV4-signed
//! with the LWA access token alongside.

use chrono::{DateTime, Utc};
use orderdeck_core::Platform;
use serde::Deserialize;
use tracing::instrument;

use crate::credentials::CredentialStore;
use crate::error::SyncError;
use crate::signing;
use crate::throttle::send_with_backoff;

use super::USER_AGENT;

/// Orders resource path under the API base.
const ORDERS_PATH: &str = "/orders/v0/orders";

/// Amazon Selling Partner API fetcher.
#[derive(Debug, Clone)]
pub struct AmazonConnector {
    http: reqwest::Client,
}

/// An Amazon order with its separately-fetched line items.
#[derive(Debug, Clone)]
pub struct AmazonOrder {
    /// Order header from the orders resource.
    pub header: AmazonOrderHeader,
    /// Line items from the order-items resource.
    pub items: Vec<AmazonOrderItem>,
}

/// A raw order header.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AmazonOrderHeader {
    /// Amazon order identifier (3-7-7 format).
    pub amazon_order_id: String,
    /// Purchase timestamp, ISO-8601 with `Z` suffix.
    pub purchase_date: String,
    /// Grand total; absent on pending orders.
    #[serde(default)]
    pub order_total: Option<AmazonMoney>,
    /// Buyer block; restricted PII, frequently absent.
    #[serde(default)]
    pub buyer_info: Option<AmazonBuyerInfo>,
}

/// Buyer block of an order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AmazonBuyerInfo {
    /// Buyer display name.
    #[serde(default)]
    pub buyer_name: Option<String>,
}

/// A monetary value as the Selling Partner API ships it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AmazonMoney {
    /// Decimal amount as a string.
    pub amount: String,
    /// ISO currency code.
    #[serde(default)]
    pub currency_code: Option<String>,
}

/// A raw order line item.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AmazonOrderItem {
    /// Amazon line identifier.
    pub order_item_id: String,
    /// Seller SKU.
    #[serde(default, rename = "SellerSKU")]
    pub seller_sku: Option<String>,
    /// Listing title.
    #[serde(default)]
    pub title: String,
    /// Units ordered.
    pub quantity_ordered: i32,
    /// Item price for the ordered quantity.
    #[serde(default)]
    pub item_price: Option<AmazonMoney>,
    /// Tax on the item price.
    #[serde(default)]
    pub item_tax: Option<AmazonMoney>,
    /// Shipping charged for this item.
    #[serde(default)]
    pub shipping_price: Option<AmazonMoney>,
    /// Shipping discount for this item.
    #[serde(default)]
    pub shipping_discount: Option<AmazonMoney>,
    /// Promotion discount for this item.
    #[serde(default)]
    pub promotion_discount: Option<AmazonMoney>,
}

#[derive(Debug, Deserialize)]
struct OrdersResponse {
    payload: OrdersPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OrdersPayload {
    #[serde(default)]
    orders: Vec<AmazonOrderHeader>,
    #[serde(default)]
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemsResponse {
    payload: ItemsPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ItemsPayload {
    #[serde(default)]
    order_items: Vec<AmazonOrderItem>,
    #[serde(default)]
    next_token: Option<String>,
}

impl AmazonConnector {
    /// Build a fetcher over a shared HTTP client.
    #[must_use]
    pub const fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Fetch orders created after the stored watermark, with line items.
    ///
    /// # Errors
    ///
    /// Returns `SyncError` on refresh, transport, or non-throttle HTTP
    /// failure - including failures of any per-order item sub-fetch.
    #[instrument(skip(self, creds))]
    pub async fn fetch_new_orders(
        &self,
        creds: &mut CredentialStore,
    ) -> Result<Vec<AmazonOrder>, SyncError> {
        let created_after = creds
            .orders_after()
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string();
        let marketplace_ids = creds.amazon().marketplace_ids.join(",");

        let mut headers = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let token = creds.access_token(&self.http, Platform::Amazon).await?;
            let mut params = vec![
                ("MarketplaceIds".to_string(), marketplace_ids.clone()),
                ("CreatedAfter".to_string(), created_after.clone()),
            ];
            if let Some(cursor) = &next_token {
                params.push(("NextToken".to_string(), cursor.clone()));
            }

            let response = self.signed_get(creds, ORDERS_PATH, &params, &token).await?;
            let page: OrdersResponse = response.json().await?;
            headers.extend(page.payload.orders);
            next_token = page.payload.next_token;
            if next_token.is_none() {
                break;
            }
        }

        let mut orders = Vec::with_capacity(headers.len());
        for header in headers {
            let items = self.fetch_order_items(creds, &header.amazon_order_id).await?;
            orders.push(AmazonOrder { header, items });
        }

        tracing::debug!(count = orders.len(), "amazon fetch complete");
        Ok(orders)
    }

    /// Fetch every line item of one order, following `NextToken`.
    async fn fetch_order_items(
        &self,
        creds: &mut CredentialStore,
        order_id: &str,
    ) -> Result<Vec<AmazonOrderItem>, SyncError> {
        let path = format!("{ORDERS_PATH}/{order_id}/orderItems");

        let mut items = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let token = creds.access_token(&self.http, Platform::Amazon).await?;
            let params: Vec<(String, String)> = next_token
                .iter()
                .map(|cursor| ("NextToken".to_string(), cursor.clone()))
                .collect();

            let response = self.signed_get(creds, &path, &params, &token).await?;
            let page: ItemsResponse = response.json().await?;
            items.extend(page.payload.order_items);
            next_token = page.payload.next_token;
            if next_token.is_none() {
                break;
            }
        }
        Ok(items)
    }

    /// Execute a signed GET, re-stamping and re-signing on every attempt.
    ///
    /// The wire query is the canonical query string, so what is signed and
    /// what is sent can never drift apart.
    async fn signed_get(
        &self,
        creds: &CredentialStore,
        path: &str,
        params: &[(String, String)],
        token: &str,
    ) -> Result<reqwest::Response, SyncError> {
        let amazon = creds.amazon();
        let url = format!("{}{}", amazon.api_base, path);
        let host = reqwest::Url::parse(&url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .ok_or_else(|| {
                SyncError::Decode(format!("invalid Amazon API base: {}", amazon.api_base))
            })?;
        let query = signing::canonical_query(params);
        let full_url = if query.is_empty() {
            url
        } else {
            format!("{url}?{query}")
        };

        send_with_backoff(|| {
            let timestamp = signing::request_timestamp(Utc::now());
            let signed_headers = [
                ("host", host.as_str()),
                ("user-agent", USER_AGENT),
                ("x-amz-access-token", token),
                ("x-amz-date", timestamp.as_str()),
            ];
            let authorization = signing::authorization_header(
                "GET",
                path,
                params,
                &signed_headers,
                &amazon.signing,
                &timestamp,
            );
            self.http
                .get(&full_url)
                .header(reqwest::header::USER_AGENT, USER_AGENT)
                .header("x-amz-access-token", token)
                .header("x-amz-date", timestamp.as_str())
                .header(reqwest::header::AUTHORIZATION, authorization)
        })
        .await
    }
}

/// The latest purchase timestamp among fetched orders - the next watermark.
pub(crate) fn latest_purchase_date<'a>(
    orders: impl Iterator<Item = &'a AmazonOrder>,
) -> Option<DateTime<Utc>> {
    orders
        .filter_map(|order| order.header.purchase_date.parse::<DateTime<Utc>>().ok())
        .max()
}
