//! Luxuffy Core - Shared domain types and pricing rules.
//!
//! This crate provides the types used by every Luxuffy component:
//! - `api` - The commerce HTTP API (cart, orders, payments, catalog)
//! - `cli` - Command-line tools for migrations, seeding and tokens
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! database access, no HTTP clients. Everything that decides a price, a
//! total or whether a status change is allowed lives here so it can be
//! tested without a database.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, money and status enums
//! - [`pricing`] - Line and ledger totals, checkout quotes, cart merge policy
//! - [`slug`] - URL slug derivation with collision suffixes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pricing;
pub mod slug;
pub mod types;

pub use types::*;
