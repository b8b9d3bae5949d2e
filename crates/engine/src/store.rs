//! The persistence boundary.
//!
//! The engine needs exactly two things from the store: the order ids it has
//! already imported for a platform, and an all-or-nothing bulk insert of a
//! run's normalized rows. [`PgOrderStore`] implements the contract over
//! `PostgreSQL`; tests substitute an in-memory implementation.

use std::collections::HashSet;
use std::time::Duration;

use orderdeck_core::{LineItem, Order, Platform};
use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::SyncError;

/// Rows per multi-row INSERT, comfortably under the bind-parameter cap.
const INSERT_CHUNK: usize = 1000;

/// What the engine requires of the normalized store.
#[allow(async_fn_in_trait)]
pub trait OrderStore {
    /// Identifiers of orders already imported for `platform`.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Persistence` on query failure.
    async fn known_order_ids(&self, platform: Platform) -> Result<HashSet<String>, SyncError>;

    /// Insert a run's orders and line items, all-or-nothing.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Persistence` on constraint violation or
    /// connectivity loss; nothing is committed in that case.
    async fn bulk_insert(&self, orders: &[Order], line_items: &[LineItem])
    -> Result<(), SyncError>;
}

/// `PostgreSQL`-backed order store.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a small pool with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Persistence` if the connection cannot be
    /// established.
    pub async fn connect(database_url: &SecretString) -> Result<Self, SyncError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url.expose_secret())
            .await?;
        Ok(Self::new(pool))
    }
}

impl OrderStore for PgOrderStore {
    async fn known_order_ids(&self, platform: Platform) -> Result<HashSet<String>, SyncError> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT order_id FROM orders WHERE platform = $1",
        )
        .bind(platform)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().collect())
    }

    async fn bulk_insert(
        &self,
        orders: &[Order],
        line_items: &[LineItem],
    ) -> Result<(), SyncError> {
        if orders.is_empty() && line_items.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for chunk in orders.chunks(INSERT_CHUNK) {
            let mut builder = QueryBuilder::<Postgres>::new(
                "INSERT INTO orders (order_id, platform, creation_date, customer_name, \
                 subtotal_amount, discount_amount, delivery_amount, tax_amount, total_amount) ",
            );
            builder.push_values(chunk, |mut row, order| {
                row.push_bind(&order.order_id)
                    .push_bind(order.platform)
                    .push_bind(&order.creation_date)
                    .push_bind(&order.customer_name)
                    .push_bind(order.subtotal_amount)
                    .push_bind(order.discount_amount)
                    .push_bind(order.delivery_amount)
                    .push_bind(order.tax_amount)
                    .push_bind(order.total_amount);
            });
            builder.build().execute(&mut *tx).await?;
        }

        for chunk in line_items.chunks(INSERT_CHUNK) {
            let mut builder = QueryBuilder::<Postgres>::new(
                "INSERT INTO line_items (line_id, order_id, sku, title, quantity, total_amount) ",
            );
            builder.push_values(chunk, |mut row, item| {
                row.push_bind(&item.line_id)
                    .push_bind(&item.order_id)
                    .push_bind(&item.sku)
                    .push_bind(&item.title)
                    .push_bind(item.quantity)
                    .push_bind(item.total_amount);
            });
            builder.build().execute(&mut *tx).await?;
        }

        tx.commit().await?;
        tracing::info!(
            orders = orders.len(),
            line_items = line_items.len(),
            "bulk insert committed"
        );
        Ok(())
    }
}
