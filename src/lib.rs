//! # B2B Wallet Ledger
//!
//! Wallet and transaction ledger for business clients, served as a JSON:API
//! REST service on top of PostgreSQL.
//!
//! Every wallet carries a balance that is the running sum of its transaction
//! amounts. Balances are never allowed to go negative: creating a withdrawal or
//! deleting a deposit is checked under a row lock before it is applied.
//!
//! ## Architecture
//!
//! - [`api`]: Public domain types re-exported for consumers
//! - [`models`]: Wallet and transaction types, decimal handling, input validation
//! - [`query`]: Filtering, sorting and pagination of list requests
//! - [`db`]: Repository traits, in-memory and Postgres backends, service layer
//! - [`http`]: Axum-based JSON:API server
//! - [`entrypoint`]: Container start-up steps (migrate, collect static assets, exec)
//! - [`config`]: Server configuration from the environment

// Allow large error types - RepositoryError carries rich context for debugging
#![allow(clippy::result_large_err)]
// The OpenAPI document is one large `json!` literal
#![recursion_limit = "256"]

pub mod api;
pub mod config;
pub mod db;
pub mod entrypoint;
pub mod logging;
pub mod models;
pub mod query;

#[cfg(feature = "http-server")]
pub mod http;
