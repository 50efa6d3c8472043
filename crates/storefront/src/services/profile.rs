//! Profile page data: the user's profile, order history and favorites.

use std::sync::Arc;

use ruya_core::{OrderId, ProductId, SortDirection};
use tracing::{instrument, warn};

use crate::backend::{
    AuthUser, DocumentStore, FieldFilter, OrderBy, Query, Snapshot, StoreError, document,
};
use crate::models::{FavoriteMark, Order, UserProfile, favorites, orders, users};

pub const ORDERS_ERROR: &str = "Error loading orders. Please try again later.";
pub const FAVORITES_ERROR: &str = "Error loading favorites. Please try again later.";
pub const PROFILE_ERROR: &str = "Failed to load profile data. Please try again.";
pub const REMOVE_FAVORITE_ERROR: &str =
    "Failed to remove product from favorites. Please try again.";

/// Everything the profile page shows. Each section loads on its own, so one
/// failure does not hide the others.
#[derive(Debug)]
pub struct ProfilePage {
    /// `Ok(None)` when the user has no profile document yet.
    pub profile: Result<Option<UserProfile>, StoreError>,
    /// Newest first.
    pub orders: Result<Vec<Order>, StoreError>,
    /// Most recently added first.
    pub favorites: Result<Vec<FavoriteMark>, StoreError>,
}

/// Reads for the profile page.
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
}

impl std::fmt::Debug for ProfileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileService").finish_non_exhaustive()
    }
}

impl ProfileService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Load all three sections concurrently.
    #[instrument(skip(self, user), fields(uid = %user.uid))]
    pub async fn load(&self, user: &AuthUser) -> ProfilePage {
        let (profile, orders, favorites) = tokio::join!(
            self.profile(user),
            self.orders(user),
            self.favorites(user),
        );
        for (section, failed) in [
            ("profile", profile.as_ref().err()),
            ("orders", orders.as_ref().err()),
            ("favorites", favorites.as_ref().err()),
        ] {
            if let Some(e) = failed {
                warn!(section, error = %e, "Profile section failed to load");
            }
        }
        ProfilePage {
            profile,
            orders,
            favorites,
        }
    }

    /// The user's profile document, if any.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read fails or the document is unreadable.
    pub async fn profile(&self, user: &AuthUser) -> Result<Option<UserProfile>, StoreError> {
        let path = users().doc(user.uid.as_str());
        self.store
            .get(&path)
            .await?
            .map(|doc| document::from_document(&path, doc))
            .transpose()
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query fails or an order is unreadable.
    pub async fn orders(&self, user: &AuthUser) -> Result<Vec<Order>, StoreError> {
        let query = Query::new(orders())
            .filter(FieldFilter::eq("userId", user.uid.as_str()))
            .order_by(OrderBy::new("orderDate", SortDirection::Descending));
        self.store
            .query(&query)
            .await?
            .iter()
            .map(|snapshot| -> Result<Order, StoreError> {
                let mut order: Order = snapshot.decode(&orders())?;
                order.id = OrderId::new(snapshot.id.clone());
                Ok(order)
            })
            .collect()
    }

    /// The user's favorite marks, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the query fails or a mark is unreadable.
    pub async fn favorites(&self, user: &AuthUser) -> Result<Vec<FavoriteMark>, StoreError> {
        let collection = favorites(&user.uid);
        let query = Query::new(collection.clone())
            .order_by(OrderBy::new("addedAt", SortDirection::Descending));
        let snapshots: Vec<Snapshot> = self.store.query(&query).await?;
        snapshots.iter().map(|s| s.decode(&collection)).collect()
    }

    /// Delete a favorite mark and return the refreshed list.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the delete or the reload fails.
    #[instrument(skip(self, user), fields(uid = %user.uid))]
    pub async fn remove_favorite(
        &self,
        user: &AuthUser,
        product_id: &ProductId,
    ) -> Result<Vec<FavoriteMark>, StoreError> {
        let path = favorites(&user.uid).doc(product_id.as_str());
        self.store.delete(&path).await?;
        self.favorites(user).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ruya_core::{Email, UserId};
    use serde_json::json;

    use super::*;
    use crate::backend::{MemoryStore, StoreOperation};

    fn shopper() -> AuthUser {
        AuthUser::new(UserId::new("u1"), Email::parse("layla@example.com").unwrap())
    }

    fn doc(value: serde_json::Value) -> crate::backend::Document {
        value.as_object().unwrap().clone()
    }

    fn order(user: &str, date: &str, total: f64) -> crate::backend::Document {
        doc(json!({
            "userId": user,
            "orderDate": date,
            "items": [],
            "shippingAddress": {},
            "paymentMethod": "Cash on Delivery",
            "status": "Pending",
            "totalAmount": total,
        }))
    }

    fn mark(id: &str, added: &str) -> crate::backend::Document {
        doc(json!({
            "id": id,
            "userId": "u1",
            "name": format!("Frame {id}"),
            "price": 20,
            "addedAt": added,
        }))
    }

    fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.insert(&users(), "u1", doc(json!({"firstName": "Layla"})));
        store.insert(&orders(), "o1", order("u1", "2025-01-05T15:04:00.000Z", 35.0));
        store.insert(&orders(), "o2", order("u1", "2025-02-01T09:00:00.000Z", 20.0));
        store.insert(&orders(), "o3", order("u2", "2025-03-01T09:00:00.000Z", 99.0));
        let favs = favorites(&UserId::new("u1"));
        store.insert(&favs, "p1", mark("p1", "2025-01-01T00:00:00.000Z"));
        store.insert(&favs, "p2", mark("p2", "2025-01-02T00:00:00.000Z"));
        store
    }

    #[tokio::test]
    async fn test_load_orders_sections_newest_first() {
        let service = ProfileService::new(seeded());
        let page = service.load(&shopper()).await;

        assert_eq!(page.profile.unwrap().unwrap().first_name, "Layla");
        let order_ids: Vec<String> = page
            .orders
            .unwrap()
            .into_iter()
            .map(|o| o.id.into_inner())
            .collect();
        assert_eq!(order_ids, ["o2", "o1"]);
        let favorite_ids: Vec<String> = page
            .favorites
            .unwrap()
            .into_iter()
            .map(|f| f.id.into_inner())
            .collect();
        assert_eq!(favorite_ids, ["p2", "p1"]);
    }

    #[tokio::test]
    async fn test_sections_fail_independently() {
        let store = seeded();
        store.fail(StoreOperation::Query);
        let page = ProfileService::new(store).load(&shopper()).await;
        assert!(page.profile.is_ok());
        assert!(page.orders.is_err());
        assert!(page.favorites.is_err());
    }

    #[tokio::test]
    async fn test_remove_favorite_returns_refreshed_list() {
        let service = ProfileService::new(seeded());
        let remaining = service
            .remove_favorite(&shopper(), &ProductId::new("p2"))
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id.as_str(), "p1");
    }
}
