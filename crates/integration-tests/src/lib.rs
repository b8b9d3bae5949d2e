//! Shared helpers for Orderdeck integration tests.
//!
//! Provides an in-memory [`OrderStore`] that mirrors the real table's
//! constraints, so pipeline tests run without a database.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::HashSet;
use std::sync::Mutex;

use orderdeck_core::{LineItem, Order, Platform};
use orderdeck_engine::{OrderStore, SyncError};

/// In-memory order store enforcing the `(order_id, platform)` identity the
/// real schema guarantees.
#[derive(Debug, Default)]
pub struct MemoryOrderStore {
    rows: Mutex<Rows>,
}

#[derive(Debug, Default)]
struct Rows {
    orders: Vec<Order>,
    line_items: Vec<LineItem>,
}

impl MemoryOrderStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an already-imported order, as a previous run would have left it.
    pub fn seed(&self, order: Order) {
        self.rows.lock().expect("store lock").orders.push(order);
    }

    /// Snapshot of the stored orders.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.rows.lock().expect("store lock").orders.clone()
    }

    /// Snapshot of the stored line items.
    #[must_use]
    pub fn line_items(&self) -> Vec<LineItem> {
        self.rows.lock().expect("store lock").line_items.clone()
    }
}

impl OrderStore for MemoryOrderStore {
    async fn known_order_ids(&self, platform: Platform) -> Result<HashSet<String>, SyncError> {
        Ok(self
            .rows
            .lock()
            .expect("store lock")
            .orders
            .iter()
            .filter(|order| order.platform == platform)
            .map(|order| order.order_id.clone())
            .collect())
    }

    async fn bulk_insert(
        &self,
        orders: &[Order],
        line_items: &[LineItem],
    ) -> Result<(), SyncError> {
        let mut rows = self.rows.lock().expect("store lock");

        // All-or-nothing: reject the whole call on a duplicate identity,
        // the way the real primary key would.
        for order in orders {
            let duplicate = rows
                .orders
                .iter()
                .any(|existing| {
                    existing.order_id == order.order_id && existing.platform == order.platform
                });
            if duplicate {
                return Err(SyncError::Persistence(sqlx::Error::Protocol(format!(
                    "duplicate key: ({}, {})",
                    order.order_id, order.platform
                ))));
            }
        }

        rows.orders.extend_from_slice(orders);
        rows.line_items.extend_from_slice(line_items);
        Ok(())
    }
}
