//! Orderdeck Engine - multi-platform incremental order synchronization.
//!
//! Pulls new orders from eBay, Amazon (Selling Partner API), and WooCommerce
//! into one normalized store, without ever re-importing an order already
//! recorded.
//!
//! # Architecture
//!
//! - [`config`] / [`credentials`] - durable credential document and token lifecycle
//! - [`signing`] - SigV4-style request signing for the Selling Partner API
//! - [`throttle`] - exponential backoff on throttling responses
//! - [`platforms`] - one fetcher per platform behind a uniform contract
//! - [`normalize`] - raw platform shapes mapped into the canonical schema
//! - [`store`] - the persistence boundary (known ids, bulk insert)
//! - [`orchestrator`] - per-platform pipelines with isolated failures
//!
//! # Incremental model
//!
//! eBay and WooCommerce stop paginating at the first already-imported order
//! id; Amazon filters server-side with a `CreatedAfter` watermark persisted
//! in the config document. A failed platform contributes zero orders for the
//! run and its watermark does not advance, so the next run recovers the
//! missed window.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod credentials;
pub mod error;
pub mod normalize;
pub mod orchestrator;
pub mod platforms;
pub mod signing;
pub mod store;
pub mod throttle;

pub use config::{ConfigDocument, ConfigError};
pub use credentials::CredentialStore;
pub use error::SyncError;
pub use orchestrator::{SyncOrchestrator, SyncPhase, SyncReport, filter_known};
pub use store::{OrderStore, PgOrderStore};
