//! Core types for Orderdeck.
//!
//! This module provides the canonical order schema every platform-specific
//! shape is normalized into, plus the helpers that keep monetary and text
//! values within storage bounds.

pub mod money;
pub mod order;
pub mod platform;
pub mod text;

pub use money::{from_cents, round_money, to_cents};
pub use order::{CUSTOMER_NAME_MAX, ITEM_TITLE_MAX, LineItem, Order};
pub use platform::{Platform, PlatformParseError};
pub use text::truncate_chars;
