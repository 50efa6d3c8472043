//! Adapters for the hosted Firebase services.
//!
//! - [`FirebaseAuth`]: email/password accounts via the Identity Toolkit REST API
//! - [`FirestoreStore`]: documents, queries and counts via the Firestore v1 REST API
//!
//! Both point at the production endpoints unless the base URLs are overridden
//! in [`FirebaseConfig`](crate::config::FirebaseConfig), e.g. for the local emulator.

mod auth;
mod firestore;
pub mod values;

pub use auth::FirebaseAuth;
pub use firestore::FirestoreStore;
