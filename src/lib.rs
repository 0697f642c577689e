//! SellerHub
//!
//! Seller backend for a multi-vendor marketplace:
//! - Order management with a validated status workflow and an append-only
//!   status-history audit ledger
//! - Delegated staff accounts (User Sellers) acting on a Super Seller's
//!   data behind a named permission set
//! - Product catalog with variants, stock, publish state, and barcode lookup
//! - Warehouses with a single-default invariant
//! - Concurrent analytics, revenue, and customer aggregation

pub mod api;
pub mod auth;
pub mod domain;
pub mod error;
pub mod models;
pub mod state;
pub mod store;
