//! Ruya Eyewear storefront library.
//!
//! Client logic for the eyewear shop: the local cart, the cursor-paginated
//! catalog, favorites, the session stream, checkout with WhatsApp hand-off,
//! accounts and the profile page. Remote services sit behind the traits in
//! [`backend`]; [`firebase`] implements them over the Firebase REST APIs and
//! [`backend::memory`] in process memory for tests and offline use.
//!
//! # Modules
//!
//! - [`backend`] - Document store, auth and key-value slot contracts
//! - [`firebase`] - Firestore and Identity Toolkit REST adapters
//! - [`config`] - Environment configuration
//! - [`models`] - Stored document types
//! - [`services`] - Controllers and services driving each page
//! - [`views`] - View models and askama partials
//! - [`error`] - Unified error type with Sentry reporting
//! - [`state`] - Backend wiring and controller construction

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod firebase;
pub mod models;
pub mod services;
pub mod state;
pub mod views;

pub use config::StorefrontConfig;
pub use error::{AppError, Result};
pub use state::{Storefront, init_sentry};
