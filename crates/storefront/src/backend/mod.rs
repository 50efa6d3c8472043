//! Contracts for the remote services and host storage the storefront talks
//! to, plus in-memory implementations of each.

pub mod auth;
pub mod document;
pub mod memory;
pub mod session;
pub mod slot;

pub use auth::{AuthError, AuthProvider};
pub use document::{
    CollectionPath, Cursor, Document, DocumentPath, DocumentStore, FieldFilter, OrderBy, Query,
    SERVER_TIMESTAMP, Snapshot, StoreError, server_timestamp,
};
pub use memory::{MemoryAuth, MemoryStore, StoreOperation};
pub use session::{AuthUser, SessionFeed, SessionSubscription};
pub use slot::{FileSlot, KeyValueSlot, MemorySlot, SlotError};
