//! Storefront services.
//!
//! # Services
//!
//! - `cart` - Client-local cart over a key-value slot
//! - `catalog` - Shop listing with cursor pagination, product lookup
//! - `favorites` - Per-user favorite marks
//! - `session` - Session stream follower, navbar and checkout form state
//! - `checkout` - Order placement and WhatsApp hand-off
//! - `account` - Sign-up, sign-in, sign-out, password reset
//! - `profile` - Profile page sections

pub mod account;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod favorites;
pub mod profile;
pub mod session;

pub use account::{AccountError, AccountService, SignUpForm};
pub use cart::{CartError, CartStore};
pub use catalog::{CatalogController, CatalogError, CatalogPage, PAGE_SIZE, ProductCatalog};
pub use checkout::{CheckoutError, CheckoutFlow, FieldError, FormField, Receipt, ShippingForm};
pub use favorites::{FavoriteError, FavoriteToggle, FavoritesController};
pub use profile::{ProfilePage, ProfileService};
pub use session::{SessionChange, SessionController};
