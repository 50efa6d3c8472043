//! Storefront wiring shared across pages.

use std::sync::Arc;

use crate::backend::{
    AuthProvider, DocumentStore, FileSlot, KeyValueSlot, MemoryAuth, MemorySlot, MemoryStore,
};
use crate::config::{StoreConfig, StorefrontConfig};
use crate::firebase::{FirebaseAuth, FirestoreStore};
use crate::services::{
    AccountService, CartStore, CatalogController, CheckoutFlow, FavoritesController,
    ProductCatalog, ProfileService, SessionController,
};

/// Backends and long-lived services for one storefront.
///
/// This struct is cheaply cloneable via `Arc`. Page controllers, which own
/// per-page state, are created from it on demand.
#[derive(Clone)]
pub struct Storefront {
    inner: Arc<StorefrontInner>,
}

struct StorefrontInner {
    store_config: StoreConfig,
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn DocumentStore>,
    cart: CartStore,
    catalog: ProductCatalog,
}

impl std::fmt::Debug for Storefront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storefront")
            .field("store_config", &self.inner.store_config)
            .finish_non_exhaustive()
    }
}

impl Storefront {
    /// Wire explicit backends.
    #[must_use]
    pub fn new(
        store_config: StoreConfig,
        auth: Arc<dyn AuthProvider>,
        store: Arc<dyn DocumentStore>,
        slot: Arc<dyn KeyValueSlot>,
    ) -> Self {
        Self {
            inner: Arc::new(StorefrontInner {
                store_config,
                catalog: ProductCatalog::new(store.clone()),
                cart: CartStore::new(slot),
                auth,
                store,
            }),
        }
    }

    /// Firebase backends, with the cart persisted under the data directory.
    /// Document store calls carry the signed-in user's token.
    #[must_use]
    pub fn connect(config: &StorefrontConfig) -> Self {
        let auth = FirebaseAuth::new(&config.firebase);
        let store = FirestoreStore::new(&config.firebase, Some(auth.subscribe()));
        Self::new(
            config.store.clone(),
            Arc::new(auth),
            Arc::new(store),
            Arc::new(FileSlot::new(&config.data_dir)),
        )
    }

    /// Everything in process memory.
    #[must_use]
    pub fn in_memory(store_config: StoreConfig) -> Self {
        Self::new(
            store_config,
            Arc::new(MemoryAuth::new()),
            Arc::new(MemoryStore::new()),
            Arc::new(MemorySlot::new()),
        )
    }

    #[must_use]
    pub fn store_config(&self) -> &StoreConfig {
        &self.inner.store_config
    }

    #[must_use]
    pub fn auth(&self) -> &Arc<dyn AuthProvider> {
        &self.inner.auth
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.inner.store
    }

    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    #[must_use]
    pub fn catalog(&self) -> &ProductCatalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn accounts(&self) -> AccountService {
        AccountService::new(self.inner.auth.clone(), self.inner.store.clone())
    }

    #[must_use]
    pub fn profiles(&self) -> ProfileService {
        ProfileService::new(self.inner.store.clone())
    }

    /// A shop listing controller on page 1.
    #[must_use]
    pub fn shop(&self) -> CatalogController {
        CatalogController::new(self.inner.store.clone())
    }

    #[must_use]
    pub fn favorites(&self) -> FavoritesController {
        FavoritesController::new(self.inner.store.clone())
    }

    /// A session controller subscribed to the auth provider.
    #[must_use]
    pub fn session(&self) -> SessionController {
        SessionController::new(self.inner.auth.as_ref(), self.inner.store.clone())
    }

    #[must_use]
    pub fn checkout(&self) -> CheckoutFlow {
        CheckoutFlow::new(
            self.inner.store.clone(),
            self.inner.cart.clone(),
            self.inner.store_config.clone(),
        )
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
///
/// Returns `None` when no DSN is configured.
#[must_use]
pub fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}
