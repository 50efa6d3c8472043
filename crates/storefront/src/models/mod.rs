//! Storefront domain models and their document layout.
//!
//! Field names follow the stored documents (camelCase). Money is
//! `rust_decimal::Decimal` kept as a JSON number on the wire; timestamps are
//! RFC 3339 strings resolved by the store.

pub mod cart;
pub mod favorite;
pub mod order;
pub mod product;
pub mod user;

pub use cart::{Cart, CartLine, CartTotals};
pub use favorite::FavoriteMark;
pub use order::{Order, OrderLine, ShippingAddress};
pub use product::{ColorVariant, GalleryImage, PLACEHOLDER_IMAGE, Product, ProductSnapshot};
pub use user::{Address, UserProfile};

use ruya_core::UserId;

use crate::backend::CollectionPath;

/// Collection holding the product catalog.
#[must_use]
pub fn products() -> CollectionPath {
    CollectionPath::new("products")
}

/// Collection holding placed orders.
#[must_use]
pub fn orders() -> CollectionPath {
    CollectionPath::new("orders")
}

/// Collection holding user profiles, keyed by uid.
#[must_use]
pub fn users() -> CollectionPath {
    CollectionPath::new("users")
}

/// A user's favorite marks, keyed by product id.
#[must_use]
pub fn favorites(uid: &UserId) -> CollectionPath {
    users().doc(uid.as_str()).subcollection("favorites")
}
