//! Paperback Core - Shared types library.
//!
//! This crate provides common types used across all Paperback components:
//! - `client` - API client and client-side state stores
//! - `cli` - Command-line storefront front end
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Everything
//! here mirrors the wire representation of the bookstore API: integer IDs,
//! decimal-string prices, snake_case status values.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, catalog/cart/order entities, and query state

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
