//! Orderdeck Core - Shared types library.
//!
//! This crate provides common types used across all Orderdeck components:
//! - `engine` - The multi-platform order synchronization engine
//! - `cli` - Command-line wrapper that invokes sync runs
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - The canonical order schema, platform enum, money and text helpers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
