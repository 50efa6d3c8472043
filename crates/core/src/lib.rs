//! Ruya Core - Shared types library.
//!
//! This crate provides the domain vocabulary used by the storefront crate:
//! - document identifiers for products, users and orders
//! - prices with display formatting
//! - validated email addresses
//! - catalog categories, sort options and order statuses
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no remote calls, no
//! persistence. This keeps it lightweight and usable from any host.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
