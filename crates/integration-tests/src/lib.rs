//! Integration tests for the Ruya Eyewear storefront.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory flows
//! cargo test -p ruya-integration-tests
//!
//! # Against the Firebase emulator (firebase emulators:start)
//! FIRESTORE_BASE_URL=http://localhost:8080/v1/ \
//! IDENTITY_TOOLKIT_BASE_URL=http://localhost:9099/identitytoolkit.googleapis.com/v1/ \
//!     cargo test -p ruya-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `shop_flow` - Catalog filtering, sorting and pagination
//! - `checkout_flow` - Cart to stored order and hand-off link
//! - `account_flow` - Sign-up, session stream, favorites and profile page
//! - `emulator` - The Firebase adapters against a local emulator

use std::sync::Arc;

use ruya_core::Email;
use ruya_storefront::backend::{
    AuthError, AuthProvider, AuthUser, Document, MemoryAuth, MemorySlot, MemoryStore,
};
use ruya_storefront::config::StoreConfig;
use ruya_storefront::models::products;
use ruya_storefront::services::CartStore;
use rust_decimal::Decimal;
use serde_json::json;

/// In-memory backend wired the way a host wires the real one.
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub auth: Arc<MemoryAuth>,
    pub slot: Arc<MemorySlot>,
    pub cart: CartStore,
    pub config: StoreConfig,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    #[must_use]
    pub fn new() -> Self {
        let slot = Arc::new(MemorySlot::new());
        Self {
            store: Arc::new(MemoryStore::new()),
            auth: Arc::new(MemoryAuth::new()),
            cart: CartStore::new(slot.clone()),
            slot,
            config: StoreConfig {
                name: "Ruءya Eyewear".to_owned(),
                whatsapp_number: "96176829297".to_owned(),
                shipping_fee: Decimal::new(1000, 2),
            },
        }
    }

    /// Seed one product document.
    pub fn seed_product(&self, id: &str, name: &str, price: f64, category: &str, day: u32) {
        let doc = json!({
            "name": name,
            "price": price,
            "category": category,
            "stock": 5,
            "imageWebpUrl": format!("/images/{id}.webp"),
            "createdAt": format!("2025-01-{day:02}T10:00:00.000Z"),
        });
        self.store.insert(&products(), id, to_document(doc));
    }

    /// Seed `count` products `p01..`, alternating men/women, price `10 * (i % 4 + 1)`.
    pub fn seed_catalog(&self, count: u32) {
        for i in 1..=count {
            let category = if i % 2 == 0 { "women" } else { "men" };
            self.seed_product(
                &format!("p{i:02}"),
                &format!("Frame {i:02}"),
                f64::from(10 * (i % 4 + 1)),
                category,
                i.min(28),
            );
        }
    }

    /// Register an account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError` if the memory provider rejects the sign-in.
    pub async fn sign_in(&self, email: &Email) -> Result<AuthUser, AuthError> {
        self.auth.register(email, "secret1");
        self.auth.sign_in(email, "secret1").await
    }
}

/// Turn a JSON object literal into a document. Non-objects become empty.
#[must_use]
pub fn to_document(value: serde_json::Value) -> Document {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Document::new(),
    }
}
