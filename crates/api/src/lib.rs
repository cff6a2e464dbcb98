//! Luxuffy commerce API library.
//!
//! Catalog, cart, orders and Paystack payments behind a JSON HTTP API. The
//! router is built by [`routes::app`] over an [`state::AppState`] holding a
//! [`store::CommerceStore`] and a [`paystack::PaymentGateway`], so the same
//! handlers run against Postgres and Paystack or against in-memory fakes.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod paystack;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
