//! Sync orchestration: per-platform pipelines with isolated failures.
//!
//! Each platform walks `Idle -> Authenticating -> Fetching -> Normalizing ->
//! Done | Failed` independently; a failure is logged once with full context
//! and swallowed at the platform boundary, so the platform simply
//! contributes zero orders this run. After every platform settles, the run
//! performs one bulk insert of all orders and one of all line items across
//! the platforms that succeeded, then durably advances the watermark.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use orderdeck_core::{LineItem, Order, Platform};
use tracing::instrument;

use crate::credentials::CredentialStore;
use crate::error::SyncError;
use crate::normalize;
use crate::platforms::{Connector, RawOrder, amazon};
use crate::store::OrderStore;

/// A platform pipeline's position in its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Not yet started.
    Idle,
    /// Ensuring a valid access token.
    Authenticating,
    /// Paginating raw orders.
    Fetching,
    /// Mapping raw shapes to the canonical schema.
    Normalizing,
    /// Terminal: contributed its batch to the run.
    Done,
    /// Terminal: logged and skipped; no watermark advanced.
    Failed,
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Authenticating => "authenticating",
            Self::Fetching => "fetching",
            Self::Normalizing => "normalizing",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Outcome of one platform's pipeline.
#[derive(Debug)]
pub struct PlatformReport {
    /// Platform this report covers.
    pub platform: Platform,
    /// Terminal phase reached.
    pub phase: SyncPhase,
    /// New orders contributed to the run's batch.
    pub fetched: usize,
    /// Error text for a `Failed` platform.
    pub error: Option<String>,
}

/// Outcome of a whole run.
#[derive(Debug)]
pub struct SyncReport {
    /// One report per platform, in run order.
    pub platforms: Vec<PlatformReport>,
    /// Orders committed by the final bulk insert.
    pub orders_inserted: usize,
    /// Line items committed by the final bulk insert.
    pub line_items_inserted: usize,
}

/// One platform's contribution to the run.
struct PlatformBatch {
    orders: Vec<Order>,
    line_items: Vec<LineItem>,
    /// Amazon only: watermark to advance once the run's insert commits.
    watermark: Option<DateTime<Utc>>,
}

/// Drives all platform pipelines and the final insertion.
pub struct SyncOrchestrator<S> {
    http: reqwest::Client,
    connectors: Vec<Connector>,
    store: S,
}

impl<S: OrderStore> SyncOrchestrator<S> {
    /// Build an orchestrator covering every platform.
    #[must_use]
    pub fn new(http: reqwest::Client, store: S) -> Self {
        let connectors = Platform::ALL
            .iter()
            .map(|&platform| Connector::for_platform(platform, http.clone()))
            .collect();
        Self {
            http,
            connectors,
            store,
        }
    }

    /// Run one sync across all platforms.
    ///
    /// # Errors
    ///
    /// Per-platform failures are contained; only a persistence failure in
    /// the final insert (or a config persist failure after it) surfaces,
    /// and nothing is committed in that case.
    #[instrument(skip_all)]
    pub async fn run(&self, creds: &mut CredentialStore) -> Result<SyncReport, SyncError> {
        let mut batch_orders: Vec<Order> = Vec::new();
        let mut batch_items: Vec<LineItem> = Vec::new();
        let mut watermark: Option<DateTime<Utc>> = None;
        let mut reports = Vec::with_capacity(self.connectors.len());

        for connector in &self.connectors {
            let platform = connector.platform();
            match self.sync_platform(connector, creds).await {
                Ok(batch) => {
                    tracing::info!(%platform, orders = batch.orders.len(), "platform sync complete");
                    reports.push(PlatformReport {
                        platform,
                        phase: SyncPhase::Done,
                        fetched: batch.orders.len(),
                        error: None,
                    });
                    batch_orders.extend(batch.orders);
                    batch_items.extend(batch.line_items);
                    watermark = watermark.max(batch.watermark);
                }
                Err(error) => {
                    // Logged once here, then swallowed at the platform
                    // boundary: the platform contributes zero orders and no
                    // watermark moves, so the next run recovers the window.
                    tracing::error!(%platform, %error, "platform sync failed");
                    reports.push(PlatformReport {
                        platform,
                        phase: SyncPhase::Failed,
                        fetched: 0,
                        error: Some(error.to_string()),
                    });
                }
            }
        }

        // One bulk insert across all succeeded platforms; an insertion
        // failure affects every platform's results for this run equally.
        self.store.bulk_insert(&batch_orders, &batch_items).await?;

        if let Some(latest) = watermark {
            creds.advance_orders_after(latest);
            creds.persist()?;
        }

        Ok(SyncReport {
            platforms: reports,
            orders_inserted: batch_orders.len(),
            line_items_inserted: batch_items.len(),
        })
    }

    /// One platform's `Authenticating -> Fetching -> Normalizing` pipeline.
    async fn sync_platform(
        &self,
        connector: &Connector,
        creds: &mut CredentialStore,
    ) -> Result<PlatformBatch, SyncError> {
        let platform = connector.platform();

        if matches!(platform, Platform::Ebay | Platform::Amazon) {
            tracing::debug!(%platform, phase = %SyncPhase::Authenticating, "entering phase");
            creds.access_token(&self.http, platform).await?;
        }

        tracing::debug!(%platform, phase = %SyncPhase::Fetching, "entering phase");
        let known_ids = self.store.known_order_ids(platform).await?;
        let raw = connector.fetch_new_orders(creds, &known_ids).await?;

        tracing::debug!(%platform, phase = %SyncPhase::Normalizing, "entering phase");
        let normalized = raw
            .iter()
            .map(normalize::normalize)
            .collect::<Result<Vec<_>, _>>()?;

        // Server-side filters are at-least-once (Amazon's CreatedAfter is
        // inclusive at the boundary), so this second gate guarantees a
        // known id never reaches bulk_insert.
        let (orders, line_items) = filter_known(normalized, &known_ids);

        let watermark = match platform {
            Platform::Amazon => amazon::latest_purchase_date(raw.iter().filter_map(|record| {
                match record {
                    RawOrder::Amazon(order) => Some(order),
                    _ => None,
                }
            })),
            _ => None,
        };

        Ok(PlatformBatch {
            orders,
            line_items,
            watermark,
        })
    }
}

/// Drop any order (and its lines) whose id the store already holds.
///
/// This is the dedup gate every platform batch passes through before the
/// run's bulk insert; an id in `known_ids` can never reach the store again.
#[must_use]
pub fn filter_known(
    normalized: Vec<(Order, Vec<LineItem>)>,
    known_ids: &HashSet<String>,
) -> (Vec<Order>, Vec<LineItem>) {
    let mut orders = Vec::with_capacity(normalized.len());
    let mut line_items = Vec::new();
    for (order, lines) in normalized {
        if known_ids.contains(&order.order_id) {
            continue;
        }
        orders.push(order);
        line_items.extend(lines);
    }
    (orders, line_items)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn order(id: &str) -> (Order, Vec<LineItem>) {
        let order = Order {
            order_id: id.to_string(),
            platform: Platform::Ebay,
            creation_date: "2024-01-01T00:00:00".to_string(),
            customer_name: "buyer".to_string(),
            subtotal_amount: Decimal::new(1000, 2),
            discount_amount: Decimal::ZERO,
            delivery_amount: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            total_amount: Decimal::new(1000, 2),
        };
        let line = LineItem {
            line_id: format!("{id}-1"),
            order_id: id.to_string(),
            sku: String::new(),
            title: "item".to_string(),
            quantity: 1,
            total_amount: Decimal::new(1000, 2),
        };
        (order, vec![line])
    }

    #[test]
    fn test_filter_known_drops_order_and_its_lines() {
        let known: HashSet<String> = ["2".to_string()].into();
        let (orders, lines) = filter_known(vec![order("1"), order("2"), order("3")], &known);

        assert_eq!(orders.len(), 2);
        assert!(orders.iter().all(|o| o.order_id != "2"));
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.order_id != "2"));
    }

    #[test]
    fn test_filter_known_with_full_coverage_yields_nothing() {
        // Idempotence: a known-id set covering every fetched order means
        // the next run contributes zero rows.
        let known: HashSet<String> = ["1".to_string(), "2".to_string()].into();
        let (orders, lines) = filter_known(vec![order("1"), order("2")], &known);
        assert!(orders.is_empty());
        assert!(lines.is_empty());
    }

    #[test]
    fn test_phase_display_names() {
        assert_eq!(SyncPhase::Authenticating.to_string(), "authenticating");
        assert_eq!(SyncPhase::Done.to_string(), "done");
        assert_eq!(SyncPhase::Failed.to_string(), "failed");
    }
}
